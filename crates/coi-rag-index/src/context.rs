//! Text sent to the embedding model for a chunk.

use crate::chunker::Chunk;

/// Prefix the chunk with its file and line range so the embedding carries
/// location context.
#[must_use]
pub fn contextualize_for_embedding(chunk: &Chunk) -> String {
    let mut text = String::with_capacity(chunk.text.len() + chunk.file.len() + 32);
    text.push_str(&chunk_header(chunk));
    text.push_str("\n\n");
    text.push_str(&chunk.text);
    text
}

/// `File: path (lines a-b)`.
#[must_use]
pub fn chunk_header(chunk: &Chunk) -> String {
    format!(
        "File: {} (lines {}-{})",
        chunk.file, chunk.start_line, chunk.end_line
    )
}
