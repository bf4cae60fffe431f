#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Connection refused, DNS failure, timeout or a broken body stream.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Service {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The response parsed but did not carry the expected field.
    #[error("empty response from {endpoint}")]
    EmptyResponse { endpoint: &'static str },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// `true` for malformed or incomplete response bodies.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Json(_) | Self::EmptyResponse { .. })
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
