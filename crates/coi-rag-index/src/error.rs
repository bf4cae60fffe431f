//! Error types for coi-rag-index.

use std::path::PathBuf;

/// Errors that can occur while building or reading the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading sources or writing artifacts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Chunk record serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// LLM runtime error (embedding).
    #[error("LLM error: {0}")]
    Llm(#[from] coi_rag_llm::LlmError),

    /// Invalid glob pattern in the collector configuration.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// One or both index artifacts are missing.
    #[error("index not found in {}", dir.display())]
    NotFound { dir: PathBuf },

    /// Artifacts exist but cannot be paired or decoded.
    #[error("corrupt index: {0}")]
    Corrupt(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
