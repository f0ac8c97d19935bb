//! # Sickle Relay
//!
//! Local HTTP bridge between Sickle and its companion scraper processes.
//!
//! The [`server`] module receives JSON payloads on the loopback interface and
//! forwards them to the bot as typed [`RelayEvent`]s over a bounded channel.
//! The [`client`] module talks back to the feed server and the forum monitor.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod payload;
pub mod server;

pub use client::{FeedClient, ForumClient, ForumReply, ForumRequest};
pub use error::RelayError;
pub use payload::*;
pub use server::{create_relay_router, serve_relay, start_relay_server, RelayState};
