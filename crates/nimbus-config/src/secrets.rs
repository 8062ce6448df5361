//! API key resolution for the LLM collaborator.
//!
//! Resolution order:
//! 1. Environment variable (`GOOGLE_AI_API_KEY`)
//! 2. Config file (with warning)

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GOOGLE_AI_API_KEY";

/// Result of API key resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the API key: environment first, then the config file value.
pub fn resolve_api_key(config_value: Option<&str>) -> Option<ResolvedSecret> {
    resolve_from(API_KEY_ENV, config_value)
}

fn resolve_from(env_var: &str, config_value: Option<&str>) -> Option<ResolvedSecret> {
    if let Ok(value) = std::env::var(env_var)
        && !value.is_empty()
    {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(env_var.to_string()),
        });
    }

    config_value
        .filter(|v| !v.is_empty())
        .map(|v| ResolvedSecret {
            value: v.to_string(),
            source: SecretSource::ConfigFile,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSET_VAR: &str = "NIMBUS_TEST_KEY_THAT_IS_NEVER_SET";

    #[test]
    fn test_resolve_from_config_value() {
        let secret = resolve_from(UNSET_VAR, Some("from-config")).unwrap();
        assert_eq!(secret.value, "from-config");
        assert_eq!(secret.source, SecretSource::ConfigFile);
    }

    #[test]
    fn test_resolve_none_when_nothing_available() {
        assert!(resolve_from(UNSET_VAR, None).is_none());
        assert!(resolve_from(UNSET_VAR, Some("")).is_none());
    }

    #[test]
    fn test_resolve_from_env_var() {
        // PATH is set in every test environment.
        let secret = resolve_from("PATH", Some("ignored")).unwrap();
        assert_eq!(secret.source, SecretSource::EnvVar("PATH".to_string()));
    }

    #[test]
    fn test_secret_source_display() {
        assert_eq!(
            SecretSource::EnvVar(API_KEY_ENV.to_string()).to_string(),
            "env var GOOGLE_AI_API_KEY"
        );
        assert_eq!(SecretSource::ConfigFile.to_string(), "config file (plaintext)");
    }
}
