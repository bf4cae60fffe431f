//! HTTP client construction for the embedding and chat endpoints.

use std::time::Duration;

use crate::error::{LlmError, Result};

/// Timeouts applied to requests against the LLM runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// TCP connect timeout for every request.
    pub connect: Duration,
    /// Total time allowed for one embedding round trip.
    pub embed: Duration,
    /// Maximum silence between two reads of a chat stream.
    pub chat_idle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            embed: Duration::from_secs(30),
            chat_idle: Duration::from_secs(300),
        }
    }
}

/// Client for short request/response calls: bounded end to end.
pub(crate) fn embed_client(timeouts: &Timeouts) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.embed)
        .user_agent(concat!("coi-rag/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LlmError::Other(format!("HTTP client construction failed: {e}")))
}

/// Client for streamed responses: no total deadline, only an idle read timeout.
pub(crate) fn stream_client(timeouts: &Timeouts) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(timeouts.connect)
        .read_timeout(timeouts.chat_idle)
        .user_agent(concat!("coi-rag/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| LlmError::Other(format!("HTTP client construction failed: {e}")))
}
