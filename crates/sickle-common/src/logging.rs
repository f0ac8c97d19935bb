//! Structured logging infrastructure for Sickle

use crate::error::{Result, SickleError};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "sickle_bot=trace")
    pub level: String,
    /// Directory for the daily rolling log file; `None` logs to console only
    pub directory: Option<PathBuf>,
    /// File name prefix for the rolling log files
    pub file_prefix: String,
    /// Whether the console layer emits ANSI colors
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "sickle.log".to_string(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Builds a logging configuration from the configured level and log path.
    ///
    /// Debug mode forces the `debug` level regardless of the configured filter.
    pub fn from_settings(level: &str, log_path: Option<PathBuf>, is_debug: bool) -> Self {
        let level = if is_debug { "debug" } else { level };
        Self {
            level: level.to_string(),
            directory: log_path,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        // RUST_LOG wins over the configured level when present
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Returns the guard of the non-blocking file writer when a log directory is
/// configured. The guard must be held for as long as logs should be flushed.
pub fn init_logging(config: LoggingConfig) -> Result<Option<WorkerGuard>> {
    let console = fmt::layer().with_target(true).with_ansi(config.ansi);
    let registry = tracing_subscriber::registry()
        .with(config.env_filter())
        .with(console);

    match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(writer);

            registry
                .with(file)
                .try_init()
                .map_err(|e| SickleError::logging(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            registry
                .try_init()
                .map_err(|e| SickleError::logging(e.to_string()))?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.directory.is_none());
        assert_eq!(config.file_prefix, "sickle.log");
        assert!(config.ansi);
    }

    #[test]
    fn test_debug_mode_overrides_level() {
        let config = LoggingConfig::from_settings("warn", None, true);
        assert_eq!(config.level, "debug");

        let config = LoggingConfig::from_settings("warn", Some(PathBuf::from("logs")), false);
        assert_eq!(config.level, "warn");
        assert_eq!(config.directory, Some(PathBuf::from("logs")));
    }
}
