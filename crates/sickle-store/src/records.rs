//! Typed records for each table and the per-guild state operations the bot
//! performs on them.

use crate::error::StoreResult;
use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sickle_common::{ChannelId, GuildId, RoleId, UserId};
use std::collections::BTreeMap;
use tracing::warn;
use uuid::Uuid;

/// Table names as they appear in the store file.
pub mod tables {
    /// Per-channel enable flag.
    pub const BOT_EN: &str = "bot_en";
    /// Per-guild bot channel.
    pub const BOT_CH: &str = "bot_ch";
    /// Per-guild custom text commands.
    pub const CUSTOM_CMDS: &str = "custom_cmds";
    /// Self-assignable roles.
    pub const SELF_ROLES: &str = "self_roles";
    /// Pending reminders.
    pub const REMINDERS: &str = "reminders";
    /// Per-guild message counters.
    pub const BOT_STATS: &str = "bot_stats";
    /// Per-command usage counters.
    pub const CMD_STATS: &str = "cmd_stats";
    /// DM info message.
    pub const BOT_INFO: &str = "bot_info";
}

const INFO_MSG_ID: &str = "info_msg";

/// `bot_en[channel]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelToggle {
    /// Whether non-`anywhere` commands may run in the channel.
    pub chan_en: bool,
}

/// `bot_ch[guild]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotChannel {
    /// The guild's designated bot channel.
    pub channel: ChannelId,
}

/// `custom_cmds[guild]`: command name to reply text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomCommands(pub BTreeMap<String, String>);

/// `self_roles["<guild>_<role>"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfRole {
    /// Guild owning the role.
    pub server: GuildId,
    /// Role id.
    pub role_id: RoleId,
    /// Lowercased role name at the time it was added.
    pub role_name: String,
}

/// `reminders[uuid]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Channel the reminder is delivered to.
    pub channel: ChannelId,
    /// User to mention.
    pub user: UserId,
    /// Guild the reminder was created in.
    pub guild: Option<GuildId>,
    /// When the reminder fires.
    pub due: DateTime<Utc>,
    /// Reminder text.
    pub text: String,
    /// When the reminder was created.
    pub created: DateTime<Utc>,
}

/// `bot_stats[guild]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotStats {
    /// Every message seen in the guild.
    pub total_msgs: u64,
    /// Messages from non-bot users.
    pub user_msgs: u64,
    /// Commands dispatched.
    pub total_cmds: u64,
}

/// `cmd_stats[cmd]`: guild id to invocation count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandUsage(pub BTreeMap<String, u64>);

impl CommandUsage {
    /// Invocations across all guilds.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

/// `bot_info["info_msg"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoMessage {
    /// Text sent in reply to direct messages.
    pub text: String,
}

/// Outcome of toggling a guild's bot channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotChannelChange {
    /// The channel became the bot channel; `previous` is the one it replaced.
    Set {
        /// Channel that was the bot channel before, if any.
        previous: Option<ChannelId>,
    },
    /// The channel was already the bot channel and has been cleared.
    Cleared,
}

fn self_role_id(guild: GuildId, role: RoleId) -> String {
    format!("{guild}_{role}")
}

impl DocumentStore {
    /// Whether the bot is enabled in `channel`. Channels default to enabled.
    pub fn is_channel_enabled(&self, channel: ChannelId) -> StoreResult<bool> {
        Ok(self
            .table::<ChannelToggle>(tables::BOT_EN)
            .get(channel)?
            .map_or(true, |toggle| toggle.chan_en))
    }

    /// Enables or disables the bot in `channel`.
    pub fn set_channel_enabled(&self, channel: ChannelId, enabled: bool) -> StoreResult<()> {
        self.table(tables::BOT_EN)
            .upsert(channel, &ChannelToggle { chan_en: enabled })
    }

    /// The guild's bot channel, if one is set.
    pub fn bot_channel(&self, guild: GuildId) -> StoreResult<Option<ChannelId>> {
        Ok(self
            .table::<BotChannel>(tables::BOT_CH)
            .get(guild)?
            .map(|entry| entry.channel))
    }

    /// Every configured bot channel.
    pub fn bot_channels(&self) -> StoreResult<Vec<(GuildId, ChannelId)>> {
        let entries = self.table::<BotChannel>(tables::BOT_CH).all()?;
        Ok(entries
            .into_iter()
            .filter_map(|(id, entry)| match id.parse::<GuildId>() {
                Ok(guild) => Some((guild, entry.channel)),
                Err(_) => {
                    warn!(doc_id = %id, "Skipping bot channel with non-numeric guild id");
                    None
                }
            })
            .collect())
    }

    /// Makes `channel` the guild's bot channel, or clears it when it already is.
    pub fn toggle_bot_channel(
        &self,
        guild: GuildId,
        channel: ChannelId,
    ) -> StoreResult<BotChannelChange> {
        self.table::<BotChannel>(tables::BOT_CH)
            .replace_with(guild, |current| match current {
                Some(entry) if entry.channel == channel => (None, BotChannelChange::Cleared),
                previous => (
                    Some(BotChannel { channel }),
                    BotChannelChange::Set {
                        previous: previous.map(|entry| entry.channel),
                    },
                ),
            })
    }

    /// Custom commands defined in `guild`.
    pub fn custom_commands(&self, guild: GuildId) -> StoreResult<CustomCommands> {
        Ok(self
            .table::<CustomCommands>(tables::CUSTOM_CMDS)
            .get(guild)?
            .unwrap_or_default())
    }

    /// Custom commands of every guild.
    pub fn all_custom_commands(&self) -> StoreResult<Vec<(GuildId, CustomCommands)>> {
        let entries = self.table::<CustomCommands>(tables::CUSTOM_CMDS).all()?;
        Ok(entries
            .into_iter()
            .filter_map(|(id, cmds)| id.parse::<GuildId>().ok().map(|guild| (guild, cmds)))
            .collect())
    }

    /// Adds or replaces a custom command.
    pub fn set_custom_command(&self, guild: GuildId, name: &str, text: &str) -> StoreResult<()> {
        self.table::<CustomCommands>(tables::CUSTOM_CMDS)
            .modify(guild, |current| {
                let mut cmds = current.unwrap_or_default();
                cmds.0.insert(name.to_string(), text.to_string());
                cmds
            })
            .map(|_| ())
    }

    /// Removes a custom command, returning whether it existed.
    pub fn remove_custom_command(&self, guild: GuildId, name: &str) -> StoreResult<bool> {
        let table = self.table::<CustomCommands>(tables::CUSTOM_CMDS);
        let Some(mut cmds) = table.get(guild)? else {
            return Ok(false);
        };
        let existed = cmds.0.remove(name).is_some();
        if existed {
            table.update(guild, &cmds)?;
        }
        Ok(existed)
    }

    /// Marks a role self-assignable.
    pub fn add_self_role(&self, guild: GuildId, role_id: RoleId, role_name: &str) -> StoreResult<()> {
        let record = SelfRole {
            server: guild,
            role_id,
            role_name: role_name.to_lowercase(),
        };
        self.table(tables::SELF_ROLES)
            .upsert(self_role_id(guild, role_id), &record)
    }

    /// Unmarks a role by id. Returns the number of records removed.
    pub fn remove_self_role_by_id(&self, guild: GuildId, role_id: RoleId) -> StoreResult<usize> {
        let removed = self
            .table::<SelfRole>(tables::SELF_ROLES)
            .remove_where(|_, role| role.server == guild && role.role_id == role_id)?;
        Ok(removed.len())
    }

    /// Unmarks a role by its stored name. Returns the number of records removed.
    pub fn remove_self_role_by_name(&self, guild: GuildId, role_name: &str) -> StoreResult<usize> {
        let role_name = role_name.to_lowercase();
        let removed = self
            .table::<SelfRole>(tables::SELF_ROLES)
            .remove_where(|_, role| role.server == guild && role.role_name == role_name)?;
        Ok(removed.len())
    }

    /// Self-assignable roles of a guild, sorted by name.
    pub fn self_roles(&self, guild: GuildId) -> StoreResult<Vec<SelfRole>> {
        let mut roles: Vec<SelfRole> = self
            .table::<SelfRole>(tables::SELF_ROLES)
            .search(|_, role| role.server == guild)?
            .into_iter()
            .map(|(_, role)| role)
            .collect();
        roles.sort_by(|a, b| a.role_name.cmp(&b.role_name));
        Ok(roles)
    }

    /// Looks up a self-assignable role by (case-insensitive) name.
    pub fn find_self_role(&self, guild: GuildId, role_name: &str) -> StoreResult<Option<SelfRole>> {
        let role_name = role_name.to_lowercase();
        Ok(self
            .self_roles(guild)?
            .into_iter()
            .find(|role| role.role_name == role_name))
    }

    /// Stores a reminder under a fresh id, which is returned.
    pub fn add_reminder(&self, reminder: &Reminder) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        self.table(tables::REMINDERS).insert(&id, reminder)?;
        Ok(id)
    }

    /// Pending reminders of `user` in `guild`, soonest first.
    pub fn reminders_for(
        &self,
        user: UserId,
        guild: Option<GuildId>,
    ) -> StoreResult<Vec<(String, Reminder)>> {
        let mut pending = self
            .table::<Reminder>(tables::REMINDERS)
            .search(|_, r| r.user == user && r.guild == guild)?;
        pending.sort_by(|(_, a), (_, b)| a.due.cmp(&b.due));
        Ok(pending)
    }

    /// Deletes a reminder.
    pub fn remove_reminder(&self, id: &str) -> StoreResult<bool> {
        self.table::<Reminder>(tables::REMINDERS).remove(id)
    }

    /// Removes and returns every reminder due at or before `now`.
    pub fn take_due_reminders(&self, now: DateTime<Utc>) -> StoreResult<Vec<(String, Reminder)>> {
        let mut due = self
            .table::<Reminder>(tables::REMINDERS)
            .take_where(|_, r| r.due <= now)?;
        due.sort_by(|(_, a), (_, b)| a.due.cmp(&b.due));
        Ok(due)
    }

    /// Counts a message seen in `guild`.
    pub fn record_message(&self, guild: GuildId, from_bot: bool) -> StoreResult<BotStats> {
        self.table::<BotStats>(tables::BOT_STATS).modify(guild, |current| {
            let mut stats = current.unwrap_or_default();
            stats.total_msgs += 1;
            if !from_bot {
                stats.user_msgs += 1;
            }
            stats
        })
    }

    /// Counts a dispatched command in both the guild and per-command counters.
    pub fn record_command(&self, guild: GuildId, command: &str) -> StoreResult<()> {
        self.table::<BotStats>(tables::BOT_STATS).modify(guild, |current| {
            let mut stats = current.unwrap_or_default();
            stats.total_cmds += 1;
            stats
        })?;
        self.table::<CommandUsage>(tables::CMD_STATS)
            .modify(command, |current| {
                let mut usage = current.unwrap_or_default();
                *usage.0.entry(guild.to_string()).or_insert(0) += 1;
                usage
            })
            .map(|_| ())
    }

    /// Message counters for `guild`, if any were recorded.
    pub fn bot_stats(&self, guild: GuildId) -> StoreResult<Option<BotStats>> {
        self.table(tables::BOT_STATS).get(guild)
    }

    /// Invocations of `command` across all guilds.
    pub fn command_total(&self, command: &str) -> StoreResult<u64> {
        Ok(self
            .table::<CommandUsage>(tables::CMD_STATS)
            .get(command)?
            .map_or(0, |usage| usage.total()))
    }

    /// The DM info message, if set.
    pub fn info_message(&self) -> StoreResult<Option<String>> {
        Ok(self
            .table::<InfoMessage>(tables::BOT_INFO)
            .get(INFO_MSG_ID)?
            .map(|info| info.text))
    }

    /// Sets the DM info message.
    pub fn set_info_message(&self, text: &str) -> StoreResult<()> {
        self.table(tables::BOT_INFO).upsert(
            INFO_MSG_ID,
            &InfoMessage {
                text: text.to_string(),
            },
        )
    }
}
