//! Configuration loading: YAML file, then environment overrides, then validation.

use crate::schema::Config;
use crate::validator::ConfigValidator;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "SICKLE_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        /// Offending variable
        var: String,
        /// Parse failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Invalid(String),
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let mut config = Self::read_file(path.as_ref())?;
        Self::apply_env_overrides(&mut config)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from `SICKLE_CONFIG_PATH`, `config.yaml`, `config.yml`,
    /// or defaults, in that order, then apply the environment.
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            return Self::load_config(config_path);
        }
        for candidate in ["config.yaml", "config.yml"] {
            if Path::new(candidate).exists() {
                return Self::load_config(candidate);
            }
        }

        info!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Parse a YAML file without applying overrides or validation.
    pub fn read_file(path: &Path) -> Result<Config, ConfigError> {
        debug!(path = %path.display(), "Reading configuration file");
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse YAML text. Missing sections and keys fall back to defaults.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |var| env::var(var).ok())
    }

    /// Apply overrides read through `lookup`, so callers can supply their own
    /// variable source.
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T>(var: &str, value: String) -> Result<T, ConfigError>
        where
            T: std::str::FromStr,
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            value.trim().parse().map_err(|e| ConfigError::EnvParse {
                var: var.to_string(),
                source: Box::new(e),
            })
        }

        if let Some(token) = lookup("DISCORD_TOKEN") {
            config.core.discord_token = token;
        }
        if let Some(prefix) = lookup("SICKLE_PREFIX") {
            config.core.cmd_prefix = prefix;
        }
        if let Some(value) = lookup("SICKLE_ADMIN_USER_ID") {
            config.core.admin_user_id = parsed("SICKLE_ADMIN_USER_ID", value)?;
        }
        if let Some(value) = lookup("SICKLE_DEBUG_CHANNEL_ID") {
            config.core.debug_channel_id = parsed("SICKLE_DEBUG_CHANNEL_ID", value)?;
        }
        if let Some(value) = lookup("SICKLE_API_PORT") {
            config.relay.api_port = parsed("SICKLE_API_PORT", value)?;
        }
        if let Some(path) = lookup("SICKLE_DB_PATH") {
            config.core.db_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("SICKLE_LOG_PATH") {
            config.core.log_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("SICKLE_DEBUG") {
            config.core.is_debug = parsed("SICKLE_DEBUG", value)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ConfigLoader::parse("core:\n  discord_token: abc\n").unwrap();
        assert_eq!(config.core.discord_token, "abc");
        assert_eq!(config.core.cmd_prefix, "<<");
        assert_eq!(config.relay.api_port, 45000);
        assert_eq!(config.tasks.reminder_poll_seconds, 5);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ConfigLoader::parse("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        ConfigLoader::apply_overrides_from(
            &mut config,
            lookup(&[
                ("DISCORD_TOKEN", "from-env"),
                ("SICKLE_PREFIX", "!"),
                ("SICKLE_ADMIN_USER_ID", "42"),
                ("SICKLE_API_PORT", "5000"),
                ("SICKLE_DEBUG", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.core.discord_token, "from-env");
        assert_eq!(config.core.cmd_prefix, "!");
        assert_eq!(config.core.admin_user_id.get(), 42);
        assert_eq!(config.relay.api_port, 5000);
        assert!(config.core.is_debug);
    }

    #[test]
    fn test_bad_env_value_names_variable() {
        let mut config = Config::default();
        let err = ConfigLoader::apply_overrides_from(
            &mut config,
            lookup(&[("SICKLE_API_PORT", "not-a-port")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("SICKLE_API_PORT"));
    }
}
