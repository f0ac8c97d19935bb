//! Application-wide error types using thiserror.

use sickle_commands::RegistryError;
use sickle_common::SickleError;
use sickle_config::ConfigError;
use sickle_store::StoreError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Document store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Command table error.
    #[error("Command registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Discord/Serenity error.
    #[error("Discord error: {0}")]
    Discord(#[from] ::serenity::Error),

    /// Shared infrastructure error.
    #[error(transparent)]
    Common(#[from] SickleError),
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
