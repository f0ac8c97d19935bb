//! # Sickle Config
//!
//! Configuration management for the Sickle bot.
//!
//! Configuration is read from YAML, overridden from the environment,
//! validated, and then held in a [`ConfigCache`] for lock-free reads.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use cache::*;
pub use defaults::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
