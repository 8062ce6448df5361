//! Configuration system for the nimbus weather assistant.
//!
//! Provides TOML-based configuration with:
//! - A `[server]` section describing how to launch the weather tool server
//! - An `[llm]` section for the optional Gemini collaborator
//! - Config file layering (user config + project-local overrides)
//! - API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigLayer, ConfigSource, LoadedConfig, config_dir, load_config,
    load_config_file, load_config_with_options, user_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{API_KEY_ENV, ResolvedSecret, SecretSource, resolve_api_key};
pub use types::*;
