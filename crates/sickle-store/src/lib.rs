//! # Sickle Store
//!
//! Embedded document store for the Sickle bot.
//!
//! Data is kept as a single JSON object of named tables, each mapping a
//! document id to a record. [`DocumentStore`] owns the data and rewrites the
//! backing file atomically on every change; [`Table`] gives typed access, and
//! the [`records`] module defines the bot's tables.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod records;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use records::*;
pub use store::{DocumentStore, Table};
