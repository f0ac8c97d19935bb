//! Relay error types.

use std::net::SocketAddr;
use thiserror::Error;

/// Errors raised by the relay server and the outbound relay clients
#[derive(Debug, Error)]
pub enum RelayError {
    /// The relay server could not bind its port
    #[error("Failed to bind relay server to {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// The relay server stopped with an I/O error
    #[error("Relay server failed: {0}")]
    Serve(#[from] std::io::Error),

    /// An outbound request timed out
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// An outbound request returned a non-success status
    #[error("Request returned HTTP {0}")]
    Status(u16),

    /// Any other outbound HTTP failure
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// The reply body was not the expected envelope
    #[error("Received invalid reply: {0}")]
    InvalidReply(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let url = err
                .url()
                .map_or_else(|| "relay peer".to_string(), ToString::to_string);
            RelayError::Timeout(url)
        } else if let Some(status) = err.status() {
            RelayError::Status(status.as_u16())
        } else {
            RelayError::Http(err)
        }
    }
}
