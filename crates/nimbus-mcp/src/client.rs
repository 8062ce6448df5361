//! Protocol session with a single weather tool server.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcNotification, JsonRpcRequest,
    ListToolsResult, Reply, ServerInfo, methods,
};
use crate::registry::ToolRegistry;
use crate::transport::{McpTransport, ProcessSpec};

/// Default bound on the wait for the server's first protocol line.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a failed handshake waits for the child to report an exit status.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// Default bound on the wait for a request's response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the tool server connection.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Name used in logs.
    pub name: String,
    /// Command to spawn.
    pub command: String,
    /// Arguments to pass to the command.
    pub args: Vec<String>,
    /// Environment variables to set.
    pub env: Vec<(String, String)>,
    /// Working directory for the server process.
    pub cwd: Option<PathBuf>,
    /// How long the handshake waits for the server to answer `initialize`.
    /// `None` waits forever.
    pub startup_timeout: Option<Duration>,
    /// How long a request waits for its response. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Pass the server's stderr through to ours.
    pub inherit_stderr: bool,
}

impl McpServerConfig {
    /// Create a new server config.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            startup_timeout: Some(DEFAULT_STARTUP_TIMEOUT),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            inherit_stderr: false,
        }
    }

    /// Add arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Add an argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add environment variables.
    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    /// Add an environment variable.
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the server's working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the handshake timeout. `None` waits forever.
    pub fn with_startup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Set the per-request timeout. `None` waits forever.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Inherit the server's stderr instead of discarding it.
    pub fn with_inherit_stderr(mut self, inherit: bool) -> Self {
        self.inherit_stderr = inherit;
        self
    }

    fn process_spec(&self) -> ProcessSpec {
        ProcessSpec {
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
            cwd: self.cwd.clone(),
            inherit_stderr: self.inherit_stderr,
        }
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No handshake has completed.
    Disconnected,
    /// The child is running and `initialize` is in flight.
    Handshaking,
    /// Tool calls are allowed.
    Ready,
    /// The session was shut down and cannot be reused.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Handshaking => "handshaking",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Results
// ─────────────────────────────────────────────────────────────────────────────

/// The raw `result` of a successful `tools/call`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult(Value);

impl ToolResult {
    /// Wrap a raw result value.
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// The displayable text of the result.
    ///
    /// Returns `content[0].text` when the result follows the content-array
    /// convention, and the compact JSON of the whole result otherwise.
    pub fn text(&self) -> String {
        self.0
            .get("content")
            .and_then(Value::as_array)
            .and_then(|content| content.first())
            .and_then(|first| first.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.0.to_string())
    }

    /// Whether the server flagged the result with `isError`.
    pub fn is_error(&self) -> bool {
        self.0
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Outcome of a tool call. Failures are values; the session stays usable.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// The server answered with a result.
    Completed(ToolResult),
    /// The server answered with an error, or did not answer.
    Failed {
        /// Server-provided or synthesized failure message.
        message: String,
    },
}

impl ToolOutcome {
    /// Check if the call failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, ToolOutcome::Failed { .. })
    }

    /// The result text, or the failure message.
    pub fn text(&self) -> String {
        match self {
            ToolOutcome::Completed(result) => result.text(),
            ToolOutcome::Failed { message } => message.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// A session with one tool server child process.
///
/// The session owns the process and both pipe ends. Each operation writes one
/// request and then blocks for its response, so at most one request is ever
/// outstanding.
pub struct McpClient {
    config: McpServerConfig,
    state: SessionState,
    transport: Option<McpTransport>,
    server_info: Option<ServerInfo>,
    tools: ToolRegistry,
    next_id: u64,
}

impl McpClient {
    /// Create a disconnected session. Nothing is spawned until [`connect`](Self::connect).
    pub fn new(config: McpServerConfig) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
            transport: None,
            server_info: None,
            tools: ToolRegistry::default(),
            next_id: 1,
        }
    }

    /// Create a disconnected session over an existing transport.
    ///
    /// [`connect`](Self::connect) performs the handshake on this transport
    /// instead of spawning a process.
    pub fn with_transport(config: McpServerConfig, transport: McpTransport) -> Self {
        let mut client = Self::new(config);
        client.transport = Some(transport);
        client
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if tool calls are allowed.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Tools fetched after the handshake.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the server info (after the handshake).
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Check if the child process is still running.
    pub fn is_connected(&mut self) -> bool {
        self.transport
            .as_mut()
            .map(McpTransport::is_connected)
            .unwrap_or(false)
    }

    /// Spawn the server, run the handshake and fetch the tool list.
    ///
    /// Any failure during the handshake tears the child down and leaves the
    /// session `Disconnected`. A failed tool listing is logged and leaves the
    /// registry empty.
    pub fn connect(&mut self) -> Result<()> {
        match self.state {
            SessionState::Ready => return Ok(()),
            SessionState::Closed => return Err(McpError::ConnectionClosed),
            SessionState::Disconnected | SessionState::Handshaking => {}
        }

        if self.transport.is_none() {
            self.transport = Some(McpTransport::spawn_stdio(&self.config.process_spec())?);
        }
        self.state = SessionState::Handshaking;

        if let Err(e) = self.handshake() {
            let e = self.startup_failure(e);
            tracing::warn!(server = %self.config.name, error = %e, "handshake failed");
            self.teardown();
            self.state = SessionState::Disconnected;
            return Err(e);
        }

        self.state = SessionState::Ready;
        tracing::info!(
            server = %self.config.name,
            command = %self.config.command,
            "connected to tool server"
        );

        if let Err(e) = self.fetch_tools() {
            tracing::warn!(server = %self.config.name, error = %e, "failed to list tools");
        }

        Ok(())
    }

    fn handshake(&mut self) -> Result<()> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let startup_timeout = self.config.startup_timeout;

        let reply = match self.request(methods::INITIALIZE, params, startup_timeout) {
            Ok(reply) => reply,
            Err(McpError::Timeout) => {
                return Err(McpError::protocol(format!(
                    "no response to initialize within {}s",
                    startup_timeout.unwrap_or_default().as_secs_f32()
                )));
            }
            Err(e) => return Err(e),
        };

        let result = match reply {
            Reply::Success(result) => result,
            Reply::Failure(err) => {
                return Err(McpError::server_error(err.code, err.message, err.data));
            }
            Reply::Missing(reason) => {
                return Err(McpError::protocol(format!("initialize failed: {}", reason)));
            }
        };

        let init: InitializeResult = serde_json::from_value(result).unwrap_or_default();
        let info = init.server_info.unwrap_or_default();

        tracing::info!(
            server = %info.name,
            version = %info.version,
            protocol = init.protocol_version.as_deref().unwrap_or("unknown"),
            "tool server initialized"
        );

        self.transport_mut()?
            .send_notification(&JsonRpcNotification::new(methods::INITIALIZED, None))?;

        self.server_info = Some(info);
        Ok(())
    }

    /// Report a dead pipe or missing reply as `SpawnFailed` when the child
    /// has already exited.
    fn startup_failure(&mut self, err: McpError) -> McpError {
        if !matches!(err, McpError::Io(_) | McpError::Protocol(_)) {
            return err;
        }
        match self.transport.as_mut().and_then(|t| t.exit_status(EXIT_GRACE)) {
            Some(status) => McpError::spawn_failed(format!(
                "'{}' exited during startup ({}): {}",
                self.config.command, status, err
            )),
            None => err,
        }
    }

    /// Fetch the server's tools into the registry.
    pub fn list_tools(&mut self) -> Result<&ToolRegistry> {
        self.fetch_tools()?;
        Ok(&self.tools)
    }

    fn fetch_tools(&mut self) -> Result<()> {
        self.ensure_ready()?;

        let timeout = self.config.request_timeout;
        let reply = self.request(methods::TOOLS_LIST, Value::Object(Default::default()), timeout)?;

        let tools = match reply {
            Reply::Success(result) => match serde_json::from_value::<ListToolsResult>(result) {
                Ok(list) => list.tools,
                Err(e) => {
                    tracing::warn!(error = %e, "unreadable tools/list result");
                    Vec::new()
                }
            },
            Reply::Failure(err) => {
                return Err(McpError::server_error(err.code, err.message, err.data));
            }
            Reply::Missing(reason) => {
                tracing::warn!(server = %self.config.name, reason = %reason, "no tools/list response");
                Vec::new()
            }
        };

        self.tools = ToolRegistry::from_descriptors(tools);

        tracing::debug!(
            server = %self.config.name,
            tool_count = self.tools.len(),
            "listed tools"
        );

        Ok(())
    }

    /// Call a tool on the server.
    ///
    /// Error payloads, missing responses and timeouts come back as
    /// [`ToolOutcome::Failed`]. Only plumbing failures (a dead pipe) and
    /// calling outside `Ready` are errors.
    pub fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolOutcome> {
        self.ensure_ready()?;

        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments,
        })?;

        let timeout = self.config.request_timeout;
        let reply = match self.request(methods::TOOLS_CALL, params, timeout) {
            Ok(reply) => reply,
            Err(McpError::Timeout) => {
                tracing::warn!(server = %self.config.name, tool = %name, "tool call timed out");
                return Ok(ToolOutcome::Failed {
                    message: format!("tool '{}' timed out", name),
                });
            }
            Err(e) => return Err(e),
        };

        let outcome = match reply {
            Reply::Success(result) => ToolOutcome::Completed(ToolResult::new(result)),
            Reply::Failure(err) => ToolOutcome::Failed {
                message: err.message,
            },
            Reply::Missing(reason) => ToolOutcome::Failed {
                message: format!("no response from tool server ({})", reason),
            },
        };

        if outcome.is_failed() {
            tracing::warn!(server = %self.config.name, tool = %name, "tool call failed");
        } else {
            tracing::debug!(server = %self.config.name, tool = %name, "tool call succeeded");
        }

        Ok(outcome)
    }

    /// Terminate the child process and close the session.
    ///
    /// Does nothing when the session is `Disconnected` or already `Closed`.
    pub fn disconnect(&mut self) -> Result<()> {
        match self.state {
            SessionState::Disconnected | SessionState::Closed => return Ok(()),
            SessionState::Handshaking | SessionState::Ready => {}
        }

        tracing::info!(server = %self.config.name, "shutting down tool server session");

        self.state = SessionState::Closed;
        self.tools = ToolRegistry::default();
        match self.transport.take() {
            Some(mut transport) => transport.shutdown(),
            None => Ok(()),
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state == SessionState::Ready {
            Ok(())
        } else {
            Err(McpError::NotReady(self.state))
        }
    }

    fn transport_mut(&mut self) -> Result<&mut McpTransport> {
        let state = self.state;
        self.transport.as_mut().ok_or(McpError::NotReady(state))
    }

    fn request(&mut self, method: &str, params: Value, timeout: Option<Duration>) -> Result<Reply> {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest::new(id, method, params);
        self.transport_mut()?.send_request(&request, timeout)
    }

    fn teardown(&mut self) {
        if let Some(mut transport) = self.transport.take()
            && let Err(e) = transport.shutdown()
        {
            tracing::debug!(error = %e, "error terminating tool server");
        }
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LineChannel;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Cursor};

    const INIT_OK: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"weather","version":"1.0"}}}"#;
    const TOOLS_OK: &str = r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"get_forecast","description":"Get weather forecast","inputSchema":{}}]}}"#;

    fn scripted(lines: &[&str]) -> McpClient {
        let mut input = lines.join("\n");
        input.push('\n');
        let channel = LineChannel::new(Cursor::new(input.into_bytes()), std::io::sink()).unwrap();
        McpClient::with_transport(
            McpServerConfig::new("weather", "unused"),
            McpTransport::from_channel(channel),
        )
    }

    #[test]
    fn test_server_config_builder() {
        let config = McpServerConfig::new("weather", "python3")
            .with_arg("weather.py")
            .with_cwd("weather-server-python")
            .with_env_var("NWS_USER_AGENT", "nimbus")
            .with_request_timeout(None);

        assert_eq!(config.name, "weather");
        assert_eq!(config.args, vec!["weather.py"]);
        assert_eq!(config.cwd, Some(PathBuf::from("weather-server-python")));
        assert_eq!(
            config.env,
            vec![("NWS_USER_AGENT".to_string(), "nimbus".to_string())]
        );
        assert_eq!(config.startup_timeout, Some(DEFAULT_STARTUP_TIMEOUT));
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Disconnected.to_string(), "disconnected");
        assert_eq!(SessionState::Ready.to_string(), "ready");
    }

    #[test]
    fn test_tool_result_text_unwraps_content() {
        let result = ToolResult::new(json!({
            "content": [{"type": "text", "text": "Sunny, 72°F"}, {"type": "text", "text": "ignored"}]
        }));
        assert_eq!(result.text(), "Sunny, 72°F");
        assert!(!result.is_error());
    }

    #[test]
    fn test_tool_result_text_falls_back_to_json() {
        let result = ToolResult::new(json!({"content": []}));
        assert_eq!(result.text(), r#"{"content":[]}"#);

        let result = ToolResult::new(json!({"content": [{"type": "image", "data": "..."}]}));
        assert!(result.text().starts_with("{\"content\""));

        let result = ToolResult::new(json!("plain"));
        assert_eq!(result.text(), "\"plain\"");
    }

    #[test]
    fn test_tool_result_is_error_flag() {
        let result = ToolResult::new(json!({"content": [], "isError": true}));
        assert!(result.is_error());
    }

    #[test]
    fn test_call_before_connect_is_not_ready() {
        let mut client = McpClient::new(McpServerConfig::new("weather", "unused"));
        let err = client.call_tool("get_forecast", json!({})).unwrap_err();
        assert!(matches!(err, McpError::NotReady(SessionState::Disconnected)));

        let err = client.list_tools().unwrap_err();
        assert!(matches!(err, McpError::NotReady(_)));
    }

    #[test]
    fn test_connect_populates_registry() {
        let mut client = scripted(&[INIT_OK, TOOLS_OK]);
        client.connect().unwrap();

        assert!(client.is_ready());
        assert_eq!(client.server_info().unwrap().name, "weather");
        assert_eq!(client.tools().names(), vec!["get_forecast"]);
    }

    #[test]
    fn test_connect_skips_banner() {
        let mut client = scripted(&["SERVER STARTING...", INIT_OK, TOOLS_OK]);
        client.connect().unwrap();
        assert_eq!(client.tools().len(), 1);
    }

    #[test]
    fn test_handshake_error_returns_to_disconnected() {
        let mut client = scripted(&[
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32603,"message":"init exploded"}}"#,
        ]);
        let err = client.connect().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("init exploded"));
        assert_eq!(client.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_handshake_without_response_is_protocol_error() {
        let mut client = scripted(&["only a banner"]);
        let err = client.connect().unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
        assert_eq!(client.state(), SessionState::Disconnected);
    }

    /// Accepts the first line written, then fails every write.
    struct BreaksAfterFirstLine {
        lines: usize,
    }

    impl std::io::Write for BreaksAfterFirstLine {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.lines >= 1 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "tool server stdin closed",
                ));
            }
            self.lines += buf.iter().filter(|&&b| b == b'\n').count();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_initialized_write_failure_aborts_connect() {
        let input = format!("{}\n{}\n", INIT_OK, TOOLS_OK);
        let channel = LineChannel::new(
            Cursor::new(input.into_bytes()),
            BreaksAfterFirstLine { lines: 0 },
        )
        .unwrap();
        let mut client = McpClient::with_transport(
            McpServerConfig::new("weather", "unused"),
            McpTransport::from_channel(channel),
        );

        let err = client.connect().unwrap_err();
        assert!(matches!(err, McpError::Io(_)));
        assert_eq!(client.state(), SessionState::Disconnected);
        assert!(client.server_info().is_none());
        assert!(client.tools().is_empty());
        // The transport was dropped with the failed handshake.
        assert!(!client.is_connected());
        assert!(matches!(
            client.call_tool("get_forecast", json!({})),
            Err(McpError::NotReady(SessionState::Disconnected))
        ));
    }

    #[test]
    fn test_missing_tools_list_leaves_registry_empty() {
        let mut client = scripted(&[INIT_OK]);
        client.connect().unwrap();
        assert!(client.is_ready());
        assert!(client.tools().is_empty());
    }

    #[test]
    fn test_call_tool_outcomes() {
        let mut client = scripted(&[
            INIT_OK,
            TOOLS_OK,
            r#"{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"Rain later"}]}}"#,
            r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32602,"message":"Unknown tool: get_tides"}}"#,
        ]);
        client.connect().unwrap();

        let outcome = client
            .call_tool("get_forecast", json!({"latitude": 40.7128, "longitude": -74.006}))
            .unwrap();
        assert_eq!(outcome.text(), "Rain later");

        let outcome = client.call_tool("get_tides", json!({})).unwrap();
        assert_eq!(
            outcome,
            ToolOutcome::Failed {
                message: "Unknown tool: get_tides".to_string()
            }
        );

        // Stream is now exhausted: a failure value, not an error.
        let outcome = client.call_tool("get_alerts", json!({"state": "CA"})).unwrap();
        assert!(outcome.is_failed());
        assert!(client.is_ready());
    }

    #[test]
    fn test_request_ids_increase_per_session() {
        let (reader, writer) = std::io::pipe().unwrap();
        let input = format!("{}\n{}\n", INIT_OK, TOOLS_OK);
        let channel = LineChannel::new(Cursor::new(input.into_bytes()), writer).unwrap();
        let mut client = McpClient::with_transport(
            McpServerConfig::new("weather", "unused"),
            McpTransport::from_channel(channel),
        );
        client.connect().unwrap();
        drop(client);

        let sent: Vec<serde_json::Value> = BufReader::new(reader)
            .lines()
            .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
            .collect();

        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0]["id"], 1);
        assert_eq!(sent[0]["method"], "initialize");
        assert_eq!(sent[1]["method"], "notifications/initialized");
        assert!(sent[1].get("id").is_none());
        assert_eq!(sent[2]["id"], 2);
        assert_eq!(sent[2]["method"], "tools/list");
        assert_eq!(sent[2]["params"], json!({}));
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut client = scripted(&[INIT_OK, TOOLS_OK]);
        client.connect().unwrap();

        client.disconnect().unwrap();
        assert_eq!(client.state(), SessionState::Closed);
        assert!(client.tools().is_empty());

        client.disconnect().unwrap();
        assert_eq!(client.state(), SessionState::Closed);
        assert!(matches!(client.connect(), Err(McpError::ConnectionClosed)));
    }

    #[test]
    fn test_disconnect_when_never_connected() {
        let mut client = McpClient::new(McpServerConfig::new("weather", "unused"));
        client.disconnect().unwrap();
        assert_eq!(client.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_connect_nonexistent_server() {
        let mut client = McpClient::new(McpServerConfig::new(
            "weather",
            "nonexistent-weather-server-12345",
        ));
        let err = client.connect().unwrap_err();
        assert!(matches!(err, McpError::ServerNotFound(_)));
        assert_eq!(client.state(), SessionState::Disconnected);
    }
}
