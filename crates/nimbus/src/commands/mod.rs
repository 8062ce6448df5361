//! CLI command handlers.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use nimbus_config::{NimbusConfig, ServerConfig};
use nimbus_llm::{GeminiConfig, SharedBackend};
use nimbus_mcp::{McpClient, McpServerConfig};
use nimbus_weather::{SharedSession, WeatherAssistant};

pub mod ask;
pub mod chat;
pub mod config;
pub mod repl;
pub mod tools;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved configuration.
    pub config: NimbusConfig,
    /// Config files that were loaded, lowest precedence first.
    pub sources: Vec<PathBuf>,
    /// Problems found while loading config.
    pub warnings: Vec<String>,
    /// Verbose output enabled.
    pub verbose: bool,
    /// `--llm` / `--no-llm` override.
    pub llm: Option<bool>,
}

/// Build the session config for the `[server]` section.
pub fn server_config(server: &ServerConfig) -> McpServerConfig {
    let config = McpServerConfig::new(&server.name, &server.command)
        .with_args(server.args.clone())
        .with_env(server.env_tuples())
        .with_startup_timeout(server.startup_timeout())
        .with_request_timeout(server.request_timeout())
        .with_inherit_stderr(server.inherit_stderr);

    match &server.cwd {
        Some(cwd) => config.with_cwd(cwd.clone()),
        None => config,
    }
}

/// Spawn the tool server and complete the handshake.
pub async fn connect(ctx: &Context) -> Result<SharedSession> {
    let server = ctx.config.server();
    let session = SharedSession::new(McpClient::new(server_config(&server)));
    session
        .connect()
        .await
        .with_context(|| format!("Failed to connect to weather server '{}'", server.name))?;
    Ok(session)
}

/// The LLM backend, if enabled and an API key is available.
pub fn llm_backend(ctx: &Context) -> Result<Option<SharedBackend>> {
    let llm = ctx.config.llm();
    if !ctx.llm.unwrap_or(llm.enabled) {
        return Ok(None);
    }

    let Some(secret) = nimbus_config::resolve_api_key(llm.api_key.as_deref()) else {
        if ctx.llm == Some(true) {
            anyhow::bail!(
                "--llm needs an API key: set {} or [llm].api_key",
                nimbus_config::API_KEY_ENV
            );
        }
        tracing::info!("No API key found, using rule-based replies");
        return Ok(None);
    };

    tracing::debug!(source = %secret.source, model = llm.model_name(), "Using Gemini");
    let mut config = GeminiConfig::new(secret.value)
        .with_base_url(llm.base_url())
        .with_model(llm.model_name());
    if let Some(secs) = llm.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(Some(nimbus_llm::create_shared_backend(config)?))
}

/// Connect to the tool server and attach the LLM, if any.
pub async fn start_assistant(ctx: &Context) -> Result<WeatherAssistant> {
    let backend = llm_backend(ctx)?;
    let assistant = WeatherAssistant::new(connect(ctx).await?);
    Ok(match backend {
        Some(backend) => assistant.with_llm(backend),
        None => assistant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nimbus_config::LlmConfig;

    fn context(config: NimbusConfig, llm: Option<bool>) -> Context {
        Context {
            config,
            sources: Vec::new(),
            warnings: Vec::new(),
            verbose: false,
            llm,
        }
    }

    #[test]
    fn test_llm_disabled_by_flag() {
        let ctx = context(NimbusConfig::new(), Some(false));
        assert!(llm_backend(&ctx).unwrap().is_none());
    }

    #[test]
    fn test_llm_disabled_in_config() {
        let config = NimbusConfig {
            llm: Some(LlmConfig {
                enabled: false,
                api_key: Some("AIza-test".to_string()),
                ..LlmConfig::default()
            }),
            ..NimbusConfig::default()
        };
        assert!(llm_backend(&context(config, None)).unwrap().is_none());
    }

    #[test]
    fn test_llm_from_config_key() {
        let config = NimbusConfig {
            llm: Some(LlmConfig {
                api_key: Some("AIza-test".to_string()),
                model: Some("gemini-1.5-flash".to_string()),
                ..LlmConfig::default()
            }),
            ..NimbusConfig::default()
        };
        let backend = llm_backend(&context(config, Some(true))).unwrap().unwrap();
        assert_eq!(backend.name(), "gemini");
    }

    #[test]
    fn test_server_config_mapping() {
        let server = ServerConfig::new("nws", "python3")
            .with_arg("weather.py")
            .with_cwd("weather-server-python");
        let config = server_config(&server);
        assert_eq!(config.name, "nws");
        assert_eq!(config.args, vec!["weather.py"]);
        assert_eq!(config.cwd, Some(PathBuf::from("weather-server-python")));
        assert_eq!(config.startup_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(60)));

        let mut server = server;
        server.startup_timeout_secs = 0;
        assert_eq!(server_config(&server).startup_timeout, None);
    }
}
