//! Live configuration shared by the gateway handlers and background tasks.

use crate::schema::Config;
use arc_swap::ArcSwap;
use sickle_common::{ChannelId, UserId};
use std::sync::Arc;

/// Holds the live configuration. Reads are lock-free snapshots.
pub struct ConfigCache {
    config: ArcSwap<Config>,
}

impl ConfigCache {
    /// Wraps an already validated configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Snapshot of the whole configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Command prefix currently in effect.
    pub fn prefix(&self) -> String {
        self.config.load().core.cmd_prefix.clone()
    }

    /// Bot administrator, unset when the id is 0.
    pub fn admin_user_id(&self) -> UserId {
        self.config.load().core.admin_user_id
    }

    /// Channel for error reports and admin relay posts, unset when 0.
    pub fn debug_channel_id(&self) -> ChannelId {
        self.config.load().core.debug_channel_id
    }
}
