//! JSON-RPC 2.0 protocol types for the weather tool server.
//!
//! Every message travels as a single line of JSON. Responses are decoded
//! leniently: the server is not guaranteed to send well-formed replies, so
//! correlation happens on a raw [`Value`] through [`Reply::correlate`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version sent in the `initialize` request.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Method names used by the session.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON-RPC Base Types
// ─────────────────────────────────────────────────────────────────────────────

/// A JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request ID for correlating responses.
    pub id: u64,
    /// Method name to call.
    pub method: String,
    /// Method parameters.
    pub params: Value,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request.
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC notification (no id, no response expected).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Method parameters (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC response as written by a server.
///
/// The session never decodes into this type (see [`Reply::correlate`]); it
/// is what tool servers, such as the test server, write back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    #[serde(default)]
    pub jsonrpc: String,
    /// Request ID this response is for.
    #[serde(default)]
    pub id: Option<u64>,
    /// Result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a success response.
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn failure(id: u64, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: None,
            error: Some(error),
        }
    }
}

/// A JSON-RPC error object.
///
/// Only `message` is relied upon; `code` defaults to 0 when a server omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    #[serde(default)]
    pub code: i64,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Optional additional data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC error codes a tool server answers with
impl JsonRpcError {
    /// Method not found.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid params.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal error.
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Create an error object.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Decode an `error` payload, keeping non-object payloads as the message.
    fn from_payload(payload: Value) -> Self {
        match serde_json::from_value::<JsonRpcError>(payload.clone()) {
            Ok(error) if !error.message.is_empty() => error,
            Ok(error) => Self {
                message: payload.to_string(),
                ..error
            },
            Err(_) => Self {
                code: 0,
                message: match payload {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
                data: None,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reply Correlation
// ─────────────────────────────────────────────────────────────────────────────

/// The outcome of one request as seen by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A matching response carrying a result (`null` when absent).
    Success(Value),
    /// A matching response carrying an error payload.
    Failure(JsonRpcError),
    /// Nothing usable arrived: the stream closed, the frame was malformed, or
    /// the id did not match the request.
    Missing(String),
}

/// How a received frame relates to the outstanding request.
#[derive(Debug, Clone, PartialEq)]
pub enum Correlation {
    /// The frame answers the outstanding request (or is unusable for it).
    Reply(Reply),
    /// The frame answers an earlier request that already gave up waiting.
    Stale(u64),
    /// A message the server sent on its own (it carries a `method`).
    ServerInitiated(String),
}

impl Reply {
    /// Correlate a decoded frame with the id of the outstanding request.
    pub fn correlate(frame: Value, expected_id: u64) -> Correlation {
        let Value::Object(mut fields) = frame else {
            return Correlation::Reply(Reply::Missing("response is not an object".to_string()));
        };

        if let Some(method) = fields.get("method").and_then(Value::as_str) {
            return Correlation::ServerInitiated(method.to_string());
        }

        let id = fields.get("id").and_then(Value::as_u64);
        match id {
            Some(id) if id < expected_id => return Correlation::Stale(id),
            Some(id) if id == expected_id => {}
            Some(id) => {
                return Correlation::Reply(Reply::Missing(format!(
                    "response id {} does not match request {}",
                    id, expected_id
                )));
            }
            None => {
                return Correlation::Reply(Reply::Missing(format!(
                    "no response for request {}",
                    expected_id
                )));
            }
        }

        match fields.remove("error") {
            Some(Value::Null) | None => Correlation::Reply(Reply::Success(
                fields.remove("result").unwrap_or(Value::Null),
            )),
            Some(payload) => Correlation::Reply(Reply::Failure(JsonRpcError::from_payload(payload))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MCP Protocol Types
// ─────────────────────────────────────────────────────────────────────────────

/// Client capabilities sent during initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCapabilities {
    /// Tool capability marker (`{}`).
    pub tools: Value,
}

impl Default for ClientCapabilities {
    fn default() -> Self {
        Self {
            tools: Value::Object(Map::new()),
        }
    }
}

/// Client info sent during initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: "nimbus".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version.
    pub protocol_version: String,
    /// Client capabilities.
    pub capabilities: ClientCapabilities,
    /// Client info.
    pub client_info: ClientInfo,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo::default(),
        }
    }
}

/// Server info returned during initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    #[serde(default)]
    pub name: String,
    /// Server version.
    #[serde(default)]
    pub version: String,
}

/// Result of the initialize request.
///
/// Every field is optional on the wire; an empty result still completes the
/// handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version.
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Server capabilities, kept raw.
    #[serde(default)]
    pub capabilities: Option<Value>,
    /// Server info.
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
}

/// A tool descriptor advertised by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name (unique identifier).
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// JSON-Schema-like description of the tool's arguments.
    #[serde(default = "empty_object")]
    pub input_schema: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Result of the tools/list request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// List of available tools.
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

/// Parameters for the tools/call request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments to pass to the tool.
    pub arguments: Value,
}
