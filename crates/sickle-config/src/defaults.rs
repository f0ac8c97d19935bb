//! Default values for every configuration section.

use crate::schema::*;
use sickle_common::{ChannelId, UserId};
use std::path::PathBuf;

/// Default command prefix.
pub const DEFAULT_PREFIX: &str = "<<";
/// Default relay server port.
pub const DEFAULT_API_PORT: u16 = 45000;
/// Default feed server and forum monitor port.
pub const DEFAULT_FEED_PORT: u16 = 44444;
/// Longest allowed interval between engagement posts.
pub const MAX_ENGAGEMENT_INTERVAL_HOURS: u64 = 24 * 365;
/// Channel receiving forum posts.
pub const FEED_CHANNEL: &str = "ot-feed";
/// Channel receiving forum posts in debug mode.
pub const DEBUG_FEED_CHANNEL: &str = "debug-ot-feed";

/// Name of the forum feed channel for the given debug state.
pub fn feed_channel_name(debug: bool) -> &'static str {
    if debug {
        DEBUG_FEED_CHANNEL
    } else {
        FEED_CHANNEL
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            admin_user_id: UserId(0),
            debug_channel_id: ChannelId(0),
            cmd_prefix: DEFAULT_PREFIX.to_string(),
            is_debug: false,
            log_path: Some(PathBuf::from("logs")),
            log_level: "info".to_string(),
            db_path: PathBuf::from("db.json"),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_port: DEFAULT_API_PORT,
            feed_server_port: DEFAULT_FEED_PORT,
            bot_forum_monitor_port: DEFAULT_FEED_PORT,
            request_timeout_seconds: 1,
            forum_timeout_seconds: 5,
            channel_capacity: 64,
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            reminder_poll_seconds: 5,
            engagement_enabled: false,
            engagement_interval_hours: 24,
        }
    }
}
