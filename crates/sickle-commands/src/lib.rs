//! # Sickle Commands
//!
//! Prefix command handling for the Sickle bot.
//!
//! Commands are plain async functions registered in a [`CommandRegistry`]
//! with their module, permission level and help text. Messages reach them
//! through [`dispatch::handle_event`], which poise calls for every gateway
//! event; guild custom commands live next to the built-ins in the registry.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod dispatch;
pub mod embeds;
pub mod framework;
pub mod parser;
pub mod permissions;
pub mod registry;
pub mod report;

pub use commands::all_commands;
pub use framework::*;
pub use parser::{parse_invocation, Invocation};
pub use permissions::Permission;
pub use registry::{Command, CommandRegistry, RegistryError, Resolved};
