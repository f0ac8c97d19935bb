//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use sickle_common::{ChannelId, UserId};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Sickle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Core bot settings.
    pub core: CoreConfig,
    /// Relay server and outbound relay clients.
    pub relay: RelayConfig,
    /// Background task settings.
    pub tasks: TasksConfig,
}

/// Core bot settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Discord bot token.
    pub discord_token: String,
    /// User allowed to run administrator commands.
    pub admin_user_id: UserId,
    /// Channel receiving error reports and admin relay posts.
    pub debug_channel_id: ChannelId,
    /// Prefix that marks a message as a command.
    pub cmd_prefix: String,
    /// Debug mode: verbose logging and the debug feed channel.
    pub is_debug: bool,
    /// Directory for rolling log files; logs go to console only when unset.
    pub log_path: Option<PathBuf>,
    /// Log filter directive.
    pub log_level: String,
    /// JSON document store file.
    pub db_path: PathBuf,
}

/// Relay server and outbound relay clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Whether the loopback relay server is started.
    pub enabled: bool,
    /// Port the relay server listens on.
    pub api_port: u16,
    /// Port of the external feed server.
    pub feed_server_port: u16,
    /// Port of the external forum monitor.
    pub bot_forum_monitor_port: u16,
    /// Timeout for feed server requests.
    pub request_timeout_seconds: u64,
    /// Timeout for forum monitor requests.
    pub forum_timeout_seconds: u64,
    /// Capacity of the relay event channel.
    pub channel_capacity: usize,
}

/// Background task settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// How often the reminder poller wakes up.
    pub reminder_poll_seconds: u64,
    /// Whether the "did you know" poster runs.
    pub engagement_enabled: bool,
    /// Interval between "did you know" posts.
    pub engagement_interval_hours: u64,
}

impl TasksConfig {
    /// How often the reminder poller wakes up.
    pub fn reminder_poll_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_poll_seconds)
    }

    /// Time between engagement posts.
    pub fn engagement_interval(&self) -> Duration {
        Duration::from_secs(self.engagement_interval_hours.saturating_mul(60 * 60))
    }
}
