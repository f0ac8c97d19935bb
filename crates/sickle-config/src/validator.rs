//! Runtime validation of a loaded configuration.

use crate::defaults::MAX_ENGAGEMENT_INTERVAL_HOURS;
use crate::loader::ConfigError;
use crate::schema::Config;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting the first problem found.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let core = &config.core;
        if core.discord_token.trim().is_empty() {
            return Err(ConfigError::Invalid("core.discord_token cannot be empty".into()));
        }
        if core.cmd_prefix.is_empty() {
            return Err(ConfigError::Invalid("core.cmd_prefix cannot be empty".into()));
        }
        if core.cmd_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "core.cmd_prefix cannot contain whitespace".into(),
            ));
        }

        let relay = &config.relay;
        for (name, port) in [
            ("relay.api_port", relay.api_port),
            ("relay.feed_server_port", relay.feed_server_port),
            ("relay.bot_forum_monitor_port", relay.bot_forum_monitor_port),
        ] {
            if port == 0 {
                return Err(ConfigError::Invalid(format!("{name} cannot be 0")));
            }
        }
        if relay.channel_capacity == 0 {
            return Err(ConfigError::Invalid("relay.channel_capacity cannot be 0".into()));
        }

        if config.tasks.reminder_poll_seconds < 1 {
            return Err(ConfigError::Invalid(
                "tasks.reminder_poll_seconds must be at least 1".into(),
            ));
        }
        if !(1..=MAX_ENGAGEMENT_INTERVAL_HOURS).contains(&config.tasks.engagement_interval_hours) {
            return Err(ConfigError::Invalid(format!(
                "tasks.engagement_interval_hours must be between 1 and {MAX_ENGAGEMENT_INTERVAL_HOURS}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.core.discord_token = "token".into();
        config
    }

    #[test]
    fn test_default_config_requires_token() {
        assert!(ConfigValidator::validate(&Config::default()).is_err());
        assert!(ConfigValidator::validate(&valid()).is_ok());
    }

    #[test]
    fn test_prefix_rules() {
        let mut config = valid();
        config.core.cmd_prefix = String::new();
        assert!(ConfigValidator::validate(&config).is_err());

        config.core.cmd_prefix = "! ".into();
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn test_ports_and_poll_interval() {
        let mut config = valid();
        config.relay.feed_server_port = 0;
        assert!(ConfigValidator::validate(&config)
            .unwrap_err()
            .to_string()
            .contains("relay.feed_server_port"));

        let mut config = valid();
        config.tasks.reminder_poll_seconds = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_engagement_interval_is_bounded() {
        let mut config = valid();
        config.tasks.engagement_interval_hours = 0;
        assert!(ConfigValidator::validate(&config).is_err());

        config.tasks.engagement_interval_hours = u64::MAX;
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("tasks.engagement_interval_hours"));

        config.tasks.engagement_interval_hours = MAX_ENGAGEMENT_INTERVAL_HOURS;
        assert!(ConfigValidator::validate(&config).is_ok());
    }
}
