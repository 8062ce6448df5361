//! Nimbus - natural-language US weather from a stdio tool server
//!
//! Main entry point for the nimbus CLI.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

mod commands;

use commands::{ask, chat, config, tools};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Nimbus - natural-language US weather from a stdio tool server
#[derive(Parser)]
#[command(name = "nimbus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the discovered ones
    #[arg(long, global = true, env = "NIMBUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Require the LLM collaborator (fails without an API key)
    #[arg(long, global = true, overrides_with = "no_llm")]
    pub llm: bool,

    /// Rule-based replies only, never call the LLM
    #[arg(long, global = true)]
    pub no_llm: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// `Some` when a flag overrides the config's `llm.enabled`.
    fn llm_override(&self) -> Option<bool> {
        match (self.llm, self.no_llm) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enter interactive weather chat (REPL)
    Chat(chat::ChatArgs),

    /// Ask a one-shot weather question
    Ask(ask::AskArgs),

    /// List the tool server's tools
    Tools(tools::ToolsArgs),

    /// Show the resolved configuration
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable, stderr) plus a daily rolling JSON file
    let filter = if cli.verbose {
        "nimbus=debug,nimbus_mcp=debug,nimbus_weather=debug,nimbus_llm=debug,nimbus_config=debug,info"
    } else {
        "nimbus=info,nimbus_mcp=warn,nimbus_weather=warn,nimbus_llm=warn,warn"
    };

    let log_dir = nimbus_config::config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "nimbus.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "nimbus=trace,nimbus_mcp=trace,nimbus_weather=trace,nimbus_llm=trace,nimbus_config=trace,info",
                )),
        )
        .init();

    let ctx = load_context(&cli)?;
    for warning in &ctx.warnings {
        tracing::warn!("{}", warning);
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Chat(args) => chat::run(args, &ctx).await,
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Tools(args) => tools::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Resolve configuration from `--config` or the discovered layers.
fn load_context(cli: &Cli) -> Result<commands::Context> {
    let (config, sources, mut warnings) = match &cli.config {
        Some(path) => {
            let config = nimbus_config::load_config_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            (config, vec![path.clone()], Vec::new())
        }
        None => {
            let loaded = nimbus_config::load_config(None)?;
            let sources = loaded
                .loaded_from()
                .into_iter()
                .map(Path::to_path_buf)
                .collect();
            (loaded.config, sources, loaded.warnings)
        }
    };

    if cli.config.is_some() && config.llm().has_plaintext_api_key() {
        warnings.push(format!(
            "[llm] contains a plaintext API key. \
             Consider setting the {} environment variable instead.",
            nimbus_config::API_KEY_ENV
        ));
    }

    Ok(commands::Context {
        config,
        sources,
        warnings,
        verbose: cli.verbose,
        llm: cli.llm_override(),
    })
}
