//! Embedding and chat client for a local Ollama runtime.

pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
mod ndjson;
pub mod ollama;
pub mod provider;

pub use error::{LlmError, Result};
pub use provider::LlmProvider;
