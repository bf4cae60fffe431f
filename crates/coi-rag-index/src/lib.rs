//! Code RAG pipeline over a source tree.
//!
//! Files matched by glob patterns are split into overlapping line windows,
//! each window is embedded through the LLM runtime, and the chunk list plus
//! embedding matrix are persisted side by side. Queries are answered by a
//! full cosine-similarity scan over the stored matrix.

pub mod chunker;
pub mod collector;
pub(crate) mod context;
pub mod error;
pub mod indexer;
pub mod matrix;
pub mod ranker;
pub mod retriever;
pub mod store;

pub use chunker::{Chunk, ChunkerConfig};
pub use error::{IndexError, Result};
pub use retriever::SearchResult;
