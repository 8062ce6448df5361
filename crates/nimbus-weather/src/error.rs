//! Error types for the weather assistant.

use thiserror::Error;

/// Result type for weather assistant operations.
pub type Result<T> = std::result::Result<T, WeatherError>;

/// Errors from the weather assistant.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Session failure (spawn, handshake, not ready).
    #[error("Tool server error: {0}")]
    Session(#[from] nimbus_mcp::McpError),

    /// LLM request failed.
    #[error("LLM error: {0}")]
    Llm(#[from] nimbus_llm::LlmError),

    /// An operation needed the LLM but none is configured.
    #[error("No LLM configured")]
    NoLlm,

    /// A blocking session task panicked or was cancelled.
    #[error("Session task failed: {0}")]
    Task(String),
}
