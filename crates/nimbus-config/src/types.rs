//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [server]                 # how to launch the weather tool server
//! [llm]                    # optional LLM collaborator
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// Both sections are optional so that partial configs (e.g. a project-local
/// override of just `[llm]`) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NimbusConfig {
    /// Tool server launch settings.
    pub server: Option<ServerConfig>,
    /// LLM collaborator settings.
    pub llm: Option<LlmConfig>,
}

impl NimbusConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not field by field.
    pub fn merge(&mut self, other: NimbusConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.llm.is_some() {
            self.llm = other.llm;
        }
    }

    /// The server section, or its defaults.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// The LLM section, or its defaults.
    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

fn default_server_name() -> String {
    "weather".to_string()
}

fn default_command() -> String {
    "python3".to_string()
}

fn default_args() -> Vec<String> {
    vec!["weather.py".to_string()]
}

fn default_cwd() -> Option<PathBuf> {
    Some(PathBuf::from("weather-server-python"))
}

fn default_startup_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

/// How to launch the weather tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name used in logs.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Command to execute to start the server.
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments to pass to the command.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Working directory for the server, relative to the current directory.
    #[serde(default = "default_cwd")]
    pub cwd: Option<PathBuf>,
    /// Environment variables to set (as [key, value] pairs).
    #[serde(default)]
    pub env: Vec<[String; 2]>,
    /// Seconds to wait for the handshake. 0 waits forever.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
    /// Seconds to wait for each response. 0 waits forever.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Show the server's stderr instead of discarding it.
    #[serde(default)]
    pub inherit_stderr: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            command: default_command(),
            args: default_args(),
            cwd: default_cwd(),
            env: Vec::new(),
            startup_timeout_secs: default_startup_timeout(),
            request_timeout_secs: default_request_timeout(),
            inherit_stderr: false,
        }
    }
}

impl ServerConfig {
    /// Create a server entry with no arguments and no working directory.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            cwd: None,
            ..Self::default()
        }
    }

    /// Add an argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add arguments.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Add an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push([key.into(), value.into()]);
        self
    }

    /// Set the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Environment variables as tuples.
    pub fn env_tuples(&self) -> Vec<(String, String)> {
        self.env
            .iter()
            .map(|[k, v]| (k.clone(), v.clone()))
            .collect()
    }

    /// `None` when the config asks to wait forever.
    pub fn startup_timeout(&self) -> Option<Duration> {
        seconds_or_forever(self.startup_timeout_secs)
    }

    /// `None` when the config asks to wait forever.
    pub fn request_timeout(&self) -> Option<Duration> {
        seconds_or_forever(self.request_timeout_secs)
    }
}

fn seconds_or_forever(secs: u64) -> Option<Duration> {
    match secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────────────────────────────────────

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

fn default_enabled() -> bool {
    true
}

/// LLM collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether to use the LLM when an API key is available.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Model identifier.
    pub model: Option<String>,
    /// API base URL override.
    pub base_url: Option<String>,
    /// API key (prefer the environment variable).
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
            base_url: None,
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    /// Get the model, falling back to the default.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Get the base URL, falling back to the default.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Check if this config contains a plaintext API key.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
