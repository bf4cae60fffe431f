//! On-disk index: `chunks.json` plus `embeddings.npy` in one directory.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::chunker::{Chunk, ChunkerConfig};
use crate::error::{IndexError, Result};
use crate::matrix::EmbeddingMatrix;

const CHUNKS_FILE: &str = "chunks.json";
const EMBEDDINGS_FILE: &str = "embeddings.npy";

/// A complete index: chunks paired positionally with embedding rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    pub chunks: Vec<Chunk>,
    pub embeddings: EmbeddingMatrix,
    /// Chunker settings the index was built with. Recorded, not enforced.
    pub config: ChunkerConfig,
}

impl Index {
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[derive(Serialize)]
struct ChunkRecordOut<'a> {
    chunks: &'a [Chunk],
    config: &'a ChunkerConfig,
}

#[derive(Deserialize)]
struct ChunkRecord {
    chunks: Vec<Chunk>,
    config: ChunkerConfig,
}

/// Reads and writes the index artifacts under a single directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn chunks_path(&self) -> PathBuf {
        self.dir.join(CHUNKS_FILE)
    }

    #[must_use]
    pub fn embeddings_path(&self) -> PathBuf {
        self.dir.join(EMBEDDINGS_FILE)
    }

    /// Both artifacts are present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.chunks_path().is_file() && self.embeddings_path().is_file()
    }

    /// Replace the stored index with `index`.
    ///
    /// Each artifact is staged in a temporary file inside the index directory
    /// and renamed over the previous one only after it is fully written.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, serialization
    /// fails, or a rename fails. Chunk and row counts must agree.
    pub fn save(&self, index: &Index) -> Result<()> {
        if index.chunks.len() != index.embeddings.rows() {
            return Err(IndexError::Corrupt(format!(
                "{} chunks but {} embedding rows",
                index.chunks.len(),
                index.embeddings.rows()
            )));
        }

        std::fs::create_dir_all(&self.dir)?;

        let chunks_tmp = self.stage(|out| {
            let record = ChunkRecordOut {
                chunks: &index.chunks,
                config: &index.config,
            };
            serde_json::to_writer_pretty(&mut *out, &record)?;
            out.flush()?;
            Ok(())
        })?;
        let matrix_tmp = self.stage(|out| index.embeddings.write_npy(out))?;

        persist(matrix_tmp, &self.embeddings_path())?;
        persist(chunks_tmp, &self.chunks_path())?;

        tracing::debug!(
            dir = %self.dir.display(),
            chunks = index.chunks.len(),
            dim = index.embeddings.dim(),
            "index saved"
        );
        Ok(())
    }

    /// Load the stored index.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either artifact is missing, `Corrupt` if the
    /// matrix cannot be decoded or its row count differs from the chunk count.
    pub fn load(&self) -> Result<Index> {
        if !self.exists() {
            return Err(IndexError::NotFound {
                dir: self.dir.clone(),
            });
        }

        let record: ChunkRecord =
            serde_json::from_reader(BufReader::new(File::open(self.chunks_path())?))?;
        let embeddings =
            EmbeddingMatrix::read_npy(BufReader::new(File::open(self.embeddings_path())?))?;

        if record.chunks.len() != embeddings.rows() {
            return Err(IndexError::Corrupt(format!(
                "{} holds {} chunks but {} has {} rows",
                CHUNKS_FILE,
                record.chunks.len(),
                EMBEDDINGS_FILE,
                embeddings.rows()
            )));
        }

        tracing::debug!(chunks = record.chunks.len(), dim = embeddings.dim(), "index loaded");

        Ok(Index {
            chunks: record.chunks,
            embeddings,
            config: record.config,
        })
    }

    fn stage(
        &self,
        write: impl FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
    ) -> Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            write(&mut out)?;
            out.flush()?;
        }
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
}

fn persist(tmp: NamedTempFile, target: &Path) -> Result<()> {
    tmp.persist(target).map_err(|e| IndexError::Io(e.error))?;
    Ok(())
}
