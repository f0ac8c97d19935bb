//! # Sickle Bot
//!
//! Discord bot dispatching prefixed text commands and relaying forum posts
//! from a local scraper into Discord.
//!
//! This is the binary crate: it owns the gateway connection and its login
//! retries, the background tasks, and the poster turning relay events into
//! embeds.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod error;
pub mod feed;
pub mod startup;
pub mod tasks;

pub use bot::*;
pub use error::*;
