//! Error types and utilities for Sickle

use thiserror::Error;

/// Result type alias for Sickle operations
pub type Result<T> = std::result::Result<T, SickleError>;

/// Errors raised by the shared infrastructure
#[derive(Error, Debug)]
pub enum SickleError {
    /// I/O related errors, such as creating the log directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging bootstrap errors
    #[error("Logging error: {message}")]
    Logging {
        /// Human readable description
        message: String,
    },
}

impl SickleError {
    /// Create a new logging error
    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging {
            message: msg.into(),
        }
    }
}
