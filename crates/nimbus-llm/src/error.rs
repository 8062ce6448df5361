//! Errors from the LLM collaborator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

/// Why a generation request produced no answer.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider failed or answered with something unusable.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The request never got an HTTP answer.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend could not be built (empty key, bad HTTP setup).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A body could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP 400: the provider rejected the request shape.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// HTTP 429.
    #[error("Quota exceeded: {0}")]
    RateLimit(String),

    /// HTTP 401/403: the API key was refused.
    #[error("API key rejected: {0}")]
    Auth(String),

    /// The prompt was blocked by the provider's safety filters.
    #[error("Prompt blocked: {0}")]
    Blocked(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "request failed"
        };
        LlmError::Network(format!("{kind}: {err}"))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
