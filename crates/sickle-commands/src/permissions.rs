//! Permission levels and the checks behind them.

use crate::framework::Data;
use crate::registry::Command;
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// Permission levels for bot commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Permission {
    /// Any user can execute this command
    Anyone = 0,
    /// Members holding the command's moderation permissions
    Moderator = 1,
    /// Only the configured bot admin
    Administrator = 2,
}

impl Permission {
    /// Get the permission level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Anyone => "Anyone",
            Permission::Moderator => "Moderator",
            Permission::Administrator => "Administrator",
        }
    }
}

/// Decides whether a user may run a command.
///
/// `member` holds the user's guild permissions when they could be resolved.
/// Moderators need the Administrator permission or any of `requires`.
pub fn is_permitted(
    required: Permission,
    is_bot_admin: bool,
    member: Option<serenity::Permissions>,
    requires: serenity::Permissions,
) -> bool {
    if is_bot_admin {
        return true;
    }
    match required {
        Permission::Anyone => true,
        Permission::Moderator => member.is_some_and(|perms| {
            perms.contains(serenity::Permissions::ADMINISTRATOR) || perms.intersects(requires)
        }),
        Permission::Administrator => false,
    }
}

/// Resolves a member's guild-wide permissions, from cache when possible.
pub async fn member_permissions(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> Option<serenity::Permissions> {
    let member = match guild_id.member(ctx, user_id).await {
        Ok(member) => member,
        Err(e) => {
            warn!("Could not fetch member {} in guild {}: {}", user_id, guild_id, e);
            return None;
        }
    };

    let cached = ctx
        .cache
        .guild(guild_id)
        .map(|guild| guild.member_permissions(&member));
    if cached.is_some() {
        return cached;
    }

    // Not cached: combine @everyone and the member's roles
    let roles = guild_id.roles(ctx).await.ok()?;
    let everyone = serenity::RoleId::new(guild_id.get());
    let perms = std::iter::once(&everyone)
        .chain(member.roles.iter())
        .filter_map(|id| roles.get(id))
        .fold(serenity::Permissions::empty(), |acc, role| acc | role.permissions);
    Some(perms)
}

/// Checks whether the message author may run `command`.
pub async fn check_command_permission(
    ctx: &serenity::Context,
    data: &Data,
    message: &serenity::Message,
    command: &Command,
) -> bool {
    let author = message.author.id;
    let is_admin = data.is_bot_admin(author);

    let member = match (command.permission, message.guild_id) {
        (Permission::Moderator, Some(guild_id)) if !is_admin => {
            member_permissions(ctx, guild_id, author).await
        }
        _ => None,
    };

    let permitted = is_permitted(command.permission, is_admin, member, command.requires);
    debug!(
        user = %author,
        command = %command.name,
        required = command.permission.as_str(),
        permitted,
        "Checked command permission"
    );
    permitted
}
