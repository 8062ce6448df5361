//! A tool server session shared with async code.
//!
//! [`McpClient`] blocks on every request. Async callers go through
//! [`SharedSession`], which runs each call on tokio's blocking pool while
//! holding the session lock, so at most one request is in flight. Name,
//! state and tools are read from a view refreshed after every call, so
//! those reads never wait behind a request.

use std::sync::Arc;

use nimbus_mcp::{McpClient, SessionState, ToolOutcome, ToolRegistry};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::error::{Result, WeatherError};

/// Cloneable handle to one tool server session.
#[derive(Clone)]
pub struct SharedSession {
    client: Arc<Mutex<McpClient>>,
    view: Arc<RwLock<SessionView>>,
}

struct SessionView {
    name: String,
    state: SessionState,
    tools: ToolRegistry,
}

impl SessionView {
    fn of(client: &McpClient) -> Self {
        Self {
            name: client.name().to_string(),
            state: client.state(),
            tools: client.tools().clone(),
        }
    }
}

impl SharedSession {
    pub fn new(client: McpClient) -> Self {
        let view = SessionView::of(&client);
        Self {
            client: Arc::new(Mutex::new(client)),
            view: Arc::new(RwLock::new(view)),
        }
    }

    /// Spawn the server (if needed) and run the handshake.
    pub async fn connect(&self) -> Result<()> {
        self.run_blocking(|client| client.connect()).await
    }

    /// Call a tool and wait for its outcome.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutcome> {
        let name = name.to_string();
        self.run_blocking(move |client| client.call_tool(&name, arguments))
            .await
    }

    /// Close the session. Safe to call more than once.
    pub async fn disconnect(&self) -> Result<()> {
        self.run_blocking(|client| client.disconnect()).await
    }

    /// The advertised tools as of the last completed operation.
    pub fn tools(&self) -> ToolRegistry {
        self.view.read().tools.clone()
    }

    pub fn state(&self) -> SessionState {
        self.view.read().state
    }

    /// Name of the configured server.
    pub fn name(&self) -> String {
        self.view.read().name.clone()
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut McpClient) -> nimbus_mcp::Result<T> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let view = Arc::clone(&self.view);
        tokio::task::spawn_blocking(move || {
            let mut client = client.lock();
            let result = op(&mut *client);
            *view.write() = SessionView::of(&client);
            result
        })
        .await
        .map_err(|e| WeatherError::Task(format!("Task join error: {e}")))?
        .map_err(WeatherError::from)
    }
}
