//! Errors from loading or writing nimbus config files.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists in the search path but could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}
