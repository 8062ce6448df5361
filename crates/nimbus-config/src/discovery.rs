//! Finding and layering nimbus config files.
//!
//! Two layers are read, the later one winning section by section:
//!
//! | layer   | path                                                  |
//! |---------|-------------------------------------------------------|
//! | user    | `$NIMBUS_CONFIG_DIR/config.toml`, else `<config dir>/nimbus/config.toml` |
//! | project | `./nimbus.toml`                                        |
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use crate::{ConfigError, NimbusConfig, Result};

const PROJECT_CONFIG_FILE: &str = "nimbus.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const APP_DIR: &str = "nimbus";

/// Overrides the user config directory (also used for logs).
pub const CONFIG_DIR_ENV: &str = "NIMBUS_CONFIG_DIR";

/// Which layer a config file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    User,
    Project,
}

/// One file that was looked for.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: ConfigLayer,
    pub path: PathBuf,
    /// False when the file was absent or broken.
    pub loaded: bool,
}

/// The merged config and what went into it.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: NimbusConfig,
    /// Lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Broken files and plaintext secrets, for the caller to report.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Paths of the files that were merged.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover and merge the user and project layers.
///
/// `project_dir` defaults to the current directory.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Like [`load_config`], with the user config directory given explicitly.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    user_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut loaded = LoadedConfig {
        config: NimbusConfig::new(),
        sources: Vec::new(),
        warnings: Vec::new(),
    };

    let user_path = match user_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_path {
        merge_layer(&mut loaded, ConfigLayer::User, path);
    }

    let project_path = match project_dir {
        Some(dir) => dir.join(PROJECT_CONFIG_FILE),
        None => PathBuf::from(PROJECT_CONFIG_FILE),
    };
    merge_layer(&mut loaded, ConfigLayer::Project, project_path);

    if loaded
        .config
        .llm
        .as_ref()
        .is_some_and(|llm| llm.has_plaintext_api_key())
    {
        loaded.warnings.push(format!(
            "[llm] contains a plaintext API key. \
             Consider setting the {} environment variable instead.",
            crate::API_KEY_ENV
        ));
    }

    Ok(loaded)
}

/// Read and parse one config file.
pub fn load_config_file(path: &Path) -> Result<NimbusConfig> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    NimbusConfig::from_toml(&contents)
}

/// `config.toml` inside [`config_dir`].
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The nimbus config directory: `$NIMBUS_CONFIG_DIR` when set, else the
/// platform config directory plus `nimbus`.
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join(APP_DIR)),
    }
}

/// Merge one file if present. A broken file is reported, not fatal.
fn merge_layer(loaded: &mut LoadedConfig, layer: ConfigLayer, path: PathBuf) {
    let mut merged = false;
    if path.is_file() {
        match load_config_file(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), ?layer, "merged config layer");
                loaded.config.merge(config);
                merged = true;
            }
            Err(e) => loaded.warnings.push(format!("Skipped {}: {}", path.display(), e)),
        }
    }

    loaded.sources.push(ConfigSource {
        layer,
        path,
        loaded: merged,
    });
}
