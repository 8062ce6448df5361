//! Stdio JSON-RPC session manager for the nimbus weather tool server.
//!
//! This crate spawns a tool server as a child process, runs the MCP
//! handshake over its stdin/stdout, and exposes the server's tools.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpClient                                                  │
//! │  - Owns the child process and session state                 │
//! │  - Implements initialize, tools/list, tools/call            │
//! │  - Fills the ToolRegistry once the handshake completes      │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpTransport / LineChannel                                 │
//! │  - One JSON document per line                               │
//! │  - Skips stray output, absorbs malformed lines              │
//! │  - Bounded reads via a reader thread                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use nimbus_mcp::{McpClient, McpServerConfig};
//!
//! let config = McpServerConfig::new("weather", "python3")
//!     .with_arg("weather.py")
//!     .with_cwd("weather-server-python");
//!
//! let mut client = McpClient::new(config);
//! client.connect()?;
//!
//! for tool in client.tools() {
//!     println!("Tool: {} - {}", tool.name, tool.description);
//! }
//!
//! let outcome = client.call_tool("get_alerts", json!({"state": "CA"}))?;
//! println!("{}", outcome.text());
//! ```
//!
//! # Wire format
//!
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"initialize","params":{...}}\n
//! ```
//!
//! The protocol flow is:
//! 1. Client sends `initialize` with capabilities
//! 2. Server responds with its capabilities
//! 3. Client sends `notifications/initialized`
//! 4. Client calls `tools/list`, then `tools/call` as needed

pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod transport;

// Re-export main types
pub use client::{McpClient, McpServerConfig, SessionState, ToolOutcome, ToolResult};
pub use error::{McpError, Result};
pub use protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, Reply, ServerInfo, ToolDescriptor,
};
pub use registry::ToolRegistry;
pub use schema::{
    AdaptedTool, ParameterSchema, PropertySchema, adapt_input_schema, function_declaration,
    function_declarations,
};
pub use transport::{Frame, LineChannel, McpTransport, ProcessSpec};
