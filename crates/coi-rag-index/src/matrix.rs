//! Dense embedding matrix and its `.npy` encoding.
//!
//! Rows are written as NumPy v1.0 `<f4` arrays of shape `(rows, dim)`.
//! Reading also accepts `<f8` (as produced by `np.save` on Python floats)
//! and the `(0,)` shape of an empty array.

use std::io::{Read, Write};

use crate::error::{IndexError, Result};

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGN: usize = 64;

/// Row-major `rows × dim` matrix of `f32`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingMatrix {
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows that must all have the same length.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` if a row length differs from the first row.
    pub fn from_rows(rows: impl IntoIterator<Item = Vec<f32>>) -> Result<Self> {
        let mut matrix = Self::new();
        for row in rows {
            matrix.push_row(&row)?;
        }
        Ok(matrix)
    }

    /// Append a row. The first row fixes the dimension.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` for an empty row or a dimension mismatch.
    pub fn push_row(&mut self, row: &[f32]) -> Result<()> {
        if row.is_empty() {
            return Err(IndexError::Corrupt("empty embedding row".into()));
        }
        if self.data.is_empty() {
            self.dim = row.len();
        } else if row.len() != self.dim {
            return Err(IndexError::Corrupt(format!(
                "embedding dimension {} does not match {}",
                row.len(),
                self.dim
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `index >= self.rows()`.
    #[must_use]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on 0, and an empty matrix has no rows anyway.
        self.data.chunks_exact(self.dim.max(1))
    }

    /// Encode as a `.npy` file.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_npy<W: Write>(&self, mut out: W) -> Result<()> {
        let dict = format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
            self.rows(),
            self.dim
        );
        // magic(6) + version(2) + header_len(2) + dict + padding + '\n'
        let unpadded = MAGIC.len() + 4 + dict.len() + 1;
        let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
        let header_len = u16::try_from(dict.len() + padding + 1)
            .map_err(|_| IndexError::Corrupt("npy header too long".into()))?;

        let mut bytes = Vec::with_capacity(unpadded + padding + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&header_len.to_le_bytes());
        bytes.extend_from_slice(dict.as_bytes());
        bytes.extend(std::iter::repeat_n(b' ', padding));
        bytes.push(b'\n');
        for value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        out.write_all(&bytes)?;
        out.flush()?;
        Ok(())
    }

    /// Decode a `.npy` file written by [`Self::write_npy`] or by NumPy.
    ///
    /// # Errors
    ///
    /// Returns `Corrupt` for anything other than a little-endian, C-ordered
    /// `f4`/`f8` array of one or two dimensions.
    pub fn read_npy<R: Read>(mut input: R) -> Result<Self> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;

        if bytes.len() < MAGIC.len() + 4 || &bytes[..MAGIC.len()] != MAGIC {
            return Err(IndexError::Corrupt("not an npy file".into()));
        }
        let major = bytes[MAGIC.len()];
        let (header_len, header_start) = match major {
            1 => (
                usize::from(u16::from_le_bytes([bytes[8], bytes[9]])),
                10,
            ),
            2 | 3 => {
                if bytes.len() < 12 {
                    return Err(IndexError::Corrupt("truncated npy header".into()));
                }
                let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
                (
                    usize::try_from(len)
                        .map_err(|_| IndexError::Corrupt("npy header too long".into()))?,
                    12,
                )
            }
            v => return Err(IndexError::Corrupt(format!("unsupported npy version {v}"))),
        };

        let data_start = header_start + header_len;
        let header = bytes
            .get(header_start..data_start)
            .ok_or_else(|| IndexError::Corrupt("truncated npy header".into()))?;
        let header = std::str::from_utf8(header)
            .map_err(|_| IndexError::Corrupt("npy header is not UTF-8".into()))?;
        let layout = parse_header(header)?;

        let (rows, dim) = layout.shape;
        let width = layout.dtype.width();
        let payload = &bytes[data_start..];
        let expected = rows
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(width))
            .ok_or_else(|| IndexError::Corrupt(format!("npy shape ({rows}, {dim}) too large")))?;
        if payload.len() != expected {
            return Err(IndexError::Corrupt(format!(
                "npy payload is {} bytes, expected {expected}",
                payload.len()
            )));
        }

        let data: Vec<f32> = match layout.dtype {
            Dtype::F4 => payload
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            #[allow(clippy::cast_possible_truncation)]
            Dtype::F8 => payload
                .chunks_exact(8)
                .map(|c| {
                    f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
                })
                .collect(),
        };

        Ok(Self {
            dim: if rows == 0 { 0 } else { dim },
            data,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F4,
    F8,
}

impl Dtype {
    fn width(self) -> usize {
        match self {
            Self::F4 => 4,
            Self::F8 => 8,
        }
    }
}

struct Layout {
    dtype: Dtype,
    shape: (usize, usize),
}

fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let needle = format!("'{key}':");
    let start = header
        .find(&needle)
        .ok_or_else(|| IndexError::Corrupt(format!("npy header lacks {key}")))?
        + needle.len();
    Ok(header[start..].trim_start())
}

fn parse_header(header: &str) -> Result<Layout> {
    let descr = dict_value(header, "descr")?;
    let dtype = if descr.starts_with("'<f4'") {
        Dtype::F4
    } else if descr.starts_with("'<f8'") {
        Dtype::F8
    } else {
        return Err(IndexError::Corrupt(format!(
            "unsupported npy dtype {}",
            descr.split(',').next().unwrap_or(descr)
        )));
    };

    if dict_value(header, "fortran_order")?.starts_with("True") {
        return Err(IndexError::Corrupt("fortran-ordered npy not supported".into()));
    }

    let shape = dict_value(header, "shape")?;
    let inner = shape
        .strip_prefix('(')
        .and_then(|s| s.split_once(')'))
        .map(|(inner, _)| inner)
        .ok_or_else(|| IndexError::Corrupt("malformed npy shape".into()))?;
    let dims: Vec<usize> = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| IndexError::Corrupt(format!("malformed npy shape ({inner})")))
        })
        .collect::<Result<_>>()?;

    let shape = match dims.as_slice() {
        [0] => (0, 0),
        [rows, dim] => (*rows, *dim),
        _ => {
            return Err(IndexError::Corrupt(format!(
                "expected a 2-D embedding matrix, got shape ({inner})"
            )));
        }
    };

    Ok(Layout { dtype, shape })
}
