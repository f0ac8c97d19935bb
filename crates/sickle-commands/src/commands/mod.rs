//! Built-in command modules.

pub mod admin;
pub mod bots;
pub mod moderation;
pub mod reminders;
pub mod roles;
pub mod utility;

use crate::registry::Command;

/// Every built-in command, grouped by module.
pub fn all_commands() -> Vec<Command> {
    [
        utility::commands(),
        moderation::commands(),
        roles::commands(),
        reminders::commands(),
        bots::commands(),
        admin::commands(),
    ]
    .into_iter()
    .flatten()
    .collect()
}
