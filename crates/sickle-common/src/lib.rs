//! # Sickle Common
//!
//! Shared types, utilities, and common functionality for the Sickle bot.
//!
//! This crate provides the error type, logging bootstrap, Discord id
//! newtypes and the text helpers used when building Discord messages.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{Result, SickleError};
pub use logging::{init_logging, LoggingConfig};
pub use types::*;
pub use utils::*;
