//! Error types for MCP session operations.
//!
//! Malformed frames and stray output lines never surface here: the framed
//! channel absorbs them. Per-call tool failures are returned as
//! [`ToolOutcome::Failed`](crate::client::ToolOutcome) values instead.

use thiserror::Error;

use crate::client::SessionState;

/// Result type for session and channel operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Everything that can stop a session from working.
#[derive(Debug, Error)]
pub enum McpError {
    /// The server command, script or working directory does not exist.
    #[error("tool server not found: {0}")]
    ServerNotFound(String),

    /// Failed to spawn the tool server process.
    #[error("failed to spawn tool server: {0}")]
    SpawnFailed(String),

    /// The reader thread or pipes could not be set up.
    #[error("transport error: {0}")]
    Transport(String),

    /// The handshake did not produce a usable response.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A request could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error, including a failed write or flush on the request pipe.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server returned an error payload during the handshake.
    #[error("server error {code}: {message}")]
    ServerError {
        /// Error code from the server (0 when the server sent none).
        code: i64,
        /// Error message from the server.
        message: String,
        /// Optional additional data.
        data: Option<serde_json::Value>,
    },

    /// An operation was issued while the session was not ready.
    #[error("session not ready (state: {0}) - call connect() first")]
    NotReady(SessionState),

    /// The session was closed and cannot be reopened.
    #[error("connection closed")]
    ConnectionClosed,

    /// No matching response arrived within the request timeout.
    #[error("timeout waiting for response")]
    Timeout,
}

impl McpError {
    pub fn server_not_found(msg: impl Into<String>) -> Self {
        Self::ServerNotFound(msg.into())
    }

    pub fn spawn_failed(msg: impl Into<String>) -> Self {
        Self::SpawnFailed(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// An error payload answered to one of our requests.
    pub fn server_error(
        code: i64,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self::ServerError {
            code,
            message: message.into(),
            data,
        }
    }

    /// Returns true for failures that abort startup (connection or handshake).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ServerNotFound(_)
                | Self::SpawnFailed(_)
                | Self::Protocol(_)
                | Self::ServerError { .. }
        )
    }
}
