//! Fixed-size line windows with overlap.

use serde::{Deserialize, Serialize};

/// One window of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Path relative to the indexed root, `/`-separated.
    pub file: String,
    /// First line, 1-based.
    pub start_line: usize,
    /// Last line, inclusive.
    pub end_line: usize,
    pub text: String,
    /// Position among the chunks emitted for `file`.
    pub chunk_idx: usize,
}

/// Chunker configuration, persisted alongside the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Window length in lines.
    pub chunk_size: usize,
    /// Lines shared by consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            overlap: 200,
        }
    }
}

impl ChunkerConfig {
    /// Distance between consecutive window starts, never less than one line.
    #[must_use]
    pub fn step(&self) -> usize {
        self.chunk_size.saturating_sub(self.overlap).max(1)
    }
}

/// Split `text` into overlapping line windows.
///
/// Whitespace-only windows are dropped without consuming a `chunk_idx`.
/// Chunking stops once a window reaches the last line, so the tail of a file
/// is never re-emitted as a short trailing window.
#[must_use]
pub fn chunk_text(text: &str, file: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    let lines: Vec<&str> = text.lines().collect();
    let size = config.chunk_size.max(1);
    let step = config.step();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < lines.len() {
        let end = (start + size).min(lines.len());
        let window = lines[start..end].join("\n");

        if !window.trim().is_empty() {
            chunks.push(Chunk {
                file: file.to_owned(),
                start_line: start + 1,
                end_line: end,
                text: window,
                chunk_idx: chunks.len(),
            });
        }

        if end == lines.len() {
            break;
        }
        start += step;
    }

    chunks
}
