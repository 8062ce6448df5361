//! Transport layer for the weather tool server.
//!
//! Messages are framed as one JSON document per line over the child
//! process's stdin/stdout. Stdout is shared with whatever else the server
//! prints, so [`LineChannel`] skips lines that are not JSON objects and
//! absorbs lines that fail to parse.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{McpError, Result};
use crate::protocol::{Correlation, JsonRpcNotification, JsonRpcRequest, Reply};

/// One frame read from the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A line starting with `{`. Lines that fail to parse decode as `{}`.
    Message(Value),
    /// The stream closed before a protocol line arrived.
    NoResponse,
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Channel
// ─────────────────────────────────────────────────────────────────────────────

/// Newline-delimited JSON over a byte stream pair.
///
/// Lines from the read half are pumped by a reader thread into a queue so
/// that a read can be bounded by a timeout. The pump only forwards raw lines;
/// all framing decisions happen on the caller's thread.
pub struct LineChannel {
    writer: Box<dyn Write + Send>,
    lines: Receiver<String>,
    closed: bool,
}

impl LineChannel {
    /// Create a channel over any reader/writer pair.
    pub fn new<R, W>(reader: R, writer: W) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("nimbus-mcp-reader".to_string())
            .spawn(move || {
                let mut reader = BufReader::new(reader);
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    match reader.read_until(b'\n', &mut buf) {
                        Ok(0) => break,
                        Ok(_) => {
                            let line = String::from_utf8_lossy(&buf).into_owned();
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "tool server stdout read failed");
                            break;
                        }
                    }
                }
            })
            .map_err(|e| McpError::transport(format!("failed to start reader thread: {}", e)))?;

        Ok(Self {
            writer: Box::new(writer),
            lines: rx,
            closed: false,
        })
    }

    /// Write one message as a single line and flush it immediately.
    pub fn write<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let json = serde_json::to_string(message)?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        tracing::trace!(json = %json, "sent MCP message");
        Ok(())
    }

    /// Block until the next protocol frame arrives or the stream closes.
    pub fn read_one(&mut self) -> Result<Frame> {
        self.read_until(None)
    }

    /// Like [`read_one`](Self::read_one) but gives up after `timeout`.
    pub fn read_one_timeout(&mut self, timeout: Duration) -> Result<Frame> {
        self.read_until(Some(Instant::now() + timeout))
    }

    /// Returns true once the read half has reached end of stream.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn read_until(&mut self, deadline: Option<Instant>) -> Result<Frame> {
        loop {
            let next = match deadline {
                Some(deadline) => self
                    .lines
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self
                    .lines
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            let line = match next {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => return Err(McpError::Timeout),
                Err(RecvTimeoutError::Disconnected) => {
                    self.closed = true;
                    tracing::warn!("no response from tool server (stream closed)");
                    return Ok(Frame::NoResponse);
                }
            };

            let trimmed = line.trim();
            if !trimmed.starts_with('{') {
                if !trimmed.is_empty() {
                    tracing::debug!(line = %trimmed, "skipping non-protocol line");
                }
                continue;
            }

            tracing::trace!(json = %trimmed, "received MCP message");

            return match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => Ok(Frame::Message(value)),
                Err(e) => {
                    tracing::warn!(error = %e, line = %trimmed, "invalid JSON from tool server");
                    Ok(Frame::Message(Value::Object(Map::new())))
                }
            };
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stdio Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Extensions that mark an argument as the server's script file.
const SCRIPT_EXTENSIONS: &[&str] = &["py", "js", "mjs", "cjs", "ts", "sh", "rb"];

/// How to launch a tool server process.
#[derive(Debug, Clone, Default)]
pub struct ProcessSpec {
    /// Program to execute.
    pub command: String,
    /// Arguments to pass to the program.
    pub args: Vec<String>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
    /// Working directory (the server's own directory).
    pub cwd: Option<PathBuf>,
    /// Pass the server's stderr through instead of discarding it.
    pub inherit_stderr: bool,
}

impl ProcessSpec {
    /// The first argument naming a script file, resolved against `cwd`.
    pub fn script_path(&self) -> Option<PathBuf> {
        let script = self.args.iter().map(Path::new).find(|arg| {
            arg.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
        })?;

        Some(match &self.cwd {
            Some(cwd) if script.is_relative() => cwd.join(script),
            _ => script.to_path_buf(),
        })
    }
}

/// A framed channel plus, for spawned servers, the owned child process.
pub struct McpTransport {
    child: Option<Child>,
    channel: LineChannel,
}

impl McpTransport {
    /// Spawn the tool server and connect to its stdio.
    pub fn spawn_stdio(spec: &ProcessSpec) -> Result<Self> {
        if let Some(ref cwd) = spec.cwd
            && !cwd.is_dir()
        {
            return Err(McpError::server_not_found(format!(
                "working directory not found: {}",
                cwd.display()
            )));
        }

        if let Some(script) = spec.script_path()
            && !script.is_file()
        {
            return Err(McpError::server_not_found(format!(
                "server script not found: {}",
                script.display()
            )));
        }

        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if spec.inherit_stderr {
                Stdio::inherit()
            } else {
                Stdio::null()
            });

        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                McpError::server_not_found(format!("'{}': {}", spec.command, e))
            } else {
                McpError::spawn_failed(format!("failed to spawn '{}': {}", spec.command, e))
            }
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::spawn_failed("failed to capture stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::spawn_failed("failed to capture stdout"))?;

        tracing::debug!(
            command = %spec.command,
            pid = child.id(),
            "spawned tool server"
        );

        Ok(Self {
            child: Some(child),
            channel: LineChannel::new(stdout, stdin)?,
        })
    }

    /// Wrap an existing channel that has no process behind it.
    pub fn from_channel(channel: LineChannel) -> Self {
        Self {
            child: None,
            channel,
        }
    }

    /// Send a request and wait for its reply.
    ///
    /// Responses to earlier requests that timed out are discarded. Any other
    /// frame is taken as the reply, so a malformed or mismatched line yields
    /// [`Reply::Missing`].
    pub fn send_request(
        &mut self,
        request: &JsonRpcRequest,
        timeout: Option<Duration>,
    ) -> Result<Reply> {
        self.channel.write(request)?;

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let frame = match deadline {
                Some(deadline) => self
                    .channel
                    .read_one_timeout(deadline.saturating_duration_since(Instant::now()))?,
                None => self.channel.read_one()?,
            };

            let value = match frame {
                Frame::Message(value) => value,
                Frame::NoResponse => {
                    return Ok(Reply::Missing("no response from server".to_string()));
                }
            };

            match Reply::correlate(value, request.id) {
                Correlation::Reply(reply) => return Ok(reply),
                Correlation::Stale(id) => {
                    tracing::debug!(id, expected = request.id, "discarding stale response");
                }
                Correlation::ServerInitiated(method) => {
                    tracing::debug!(%method, "ignoring server-initiated message");
                }
            }
        }
    }

    /// Send a notification (no response expected).
    pub fn send_notification(&mut self, notification: &JsonRpcNotification) -> Result<()> {
        self.channel.write(notification)
    }

    /// Terminate the child process, if any, and wait for it to exit.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            tracing::debug!(pid = child.id(), "terminating tool server");
            // kill() fails if the process already exited; wait() still reaps it.
            let _ = child.kill();
            child.wait()?;
        }
        Ok(())
    }

    /// Check if the transport is still usable.
    pub fn is_connected(&mut self) -> bool {
        if self.channel.is_closed() {
            return false;
        }
        match self.child {
            Some(ref mut child) => matches!(child.try_wait(), Ok(None)),
            None => true,
        }
    }

    /// The child's exit status, if it exits within `grace`.
    ///
    /// Returns `None` while the child keeps running, and for transports
    /// without a process.
    pub fn exit_status(&mut self, grace: Duration) -> Option<ExitStatus> {
        let child = self.child.as_mut()?;
        let deadline = Instant::now() + grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => return None,
            }
        }
    }

    /// Whether a child process is owned by this transport.
    pub fn has_process(&self) -> bool {
        self.child.is_some()
    }
}

impl Drop for McpTransport {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
