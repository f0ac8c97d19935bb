//! Message event handling: the gate between a Discord message and a handler.

use crate::embeds;
use crate::framework::{CommandContext, Data, Error, FrameworkContext};
use crate::parser::parse_invocation;
use crate::permissions::check_command_permission;
use crate::registry::{Command, Resolved};
use crate::report;
use poise::serenity_prelude as serenity;
use sickle_common::{ChannelId, GuildId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Poise event handler entry point.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: FrameworkContext<'_>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => handle_message(ctx, new_message, data).await,
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "Connected as {} to {} guilds",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

/// What to do with an incoming message, decided from its origin alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Our own message, or a bot's direct message.
    Ignore,
    /// A bot's guild message: counted, never dispatched.
    RecordOnly,
    /// A user's direct message: answered with the info message.
    DirectMessage,
    /// A user's guild message: counted, then parsed as a command.
    Command,
}

impl Gate {
    /// Whether the message counts towards the guild's stats.
    pub fn records_stats(self) -> bool {
        matches!(self, Gate::RecordOnly | Gate::Command)
    }
}

/// Classifies a message by who sent it and where.
pub fn screen_message(from_self: bool, from_bot: bool, in_guild: bool) -> Gate {
    match (from_self, from_bot, in_guild) {
        (true, _, _) => Gate::Ignore,
        (false, true, true) => Gate::RecordOnly,
        (false, true, false) => Gate::Ignore,
        (false, false, false) => Gate::DirectMessage,
        (false, false, true) => Gate::Command,
    }
}

/// Whether a command may run in a channel. `enabled` is only read for
/// commands that honour the channel toggle.
pub fn channel_open(anywhere: bool, enabled: impl FnOnce() -> bool) -> bool {
    anywhere || enabled()
}

/// Runs one message through stats, parsing, lookup and the permission gates,
/// then spawns the handler.
pub async fn handle_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    let gate = screen_message(
        message.author.id == ctx.cache.current_user().id,
        message.author.bot,
        message.guild_id.is_some(),
    );

    if let (true, Some(guild_id)) = (gate.records_stats(), message.guild_id) {
        if let Err(e) = data
            .store
            .record_message(GuildId(guild_id.get()), message.author.bot)
        {
            warn!("Failed to record message stats: {}", e);
        }
    }

    let guild = match (gate, message.guild_id) {
        (Gate::DirectMessage, _) => return reply_to_direct_message(ctx, message, data).await,
        (Gate::Command, Some(guild_id)) => GuildId(guild_id.get()),
        _ => return Ok(()),
    };

    let prefix = data.prefix();
    let Some(invocation) = parse_invocation(&prefix, &message.content) else {
        return Ok(());
    };

    let Some(resolved) = data.registry.resolve(Some(guild), &invocation.name) else {
        debug!(name = %invocation.name, "Ignoring unknown command");
        return Ok(());
    };

    if !channel_open(resolved.anywhere(), || channel_enabled(data, message.channel_id)) {
        debug!(channel = %message.channel_id, "Bot disabled in channel");
        return Ok(());
    }

    let command = match resolved {
        Resolved::Builtin(command) => command.clone(),
        Resolved::Custom(text) => {
            message.channel_id.say(ctx, text).await?;
            count_usage(data, guild, &invocation.name);
            return Ok(());
        }
    };

    if !check_command_permission(ctx, data, message, &command).await {
        let denied = serenity::CreateMessage::new().embed(embeds::permission_denied(command.permission));
        message.channel_id.send_message(ctx, denied).await?;
        return Ok(());
    }

    let cmd_ctx = CommandContext {
        serenity: ctx.clone(),
        message: Arc::new(message.clone()),
        data: data.clone(),
        name: invocation.name.clone(),
        args: invocation.args,
    };
    tokio::spawn(run_command(command, cmd_ctx));
    count_usage(data, guild, &invocation.name);
    Ok(())
}

fn channel_enabled(data: &Data, channel: serenity::ChannelId) -> bool {
    data.store
        .is_channel_enabled(ChannelId(channel.get()))
        .unwrap_or_else(|e| {
            warn!("Failed to read channel toggle, assuming enabled: {}", e);
            true
        })
}

fn count_usage(data: &Data, guild: GuildId, name: &str) {
    if let Err(e) = data.store.record_command(guild, name) {
        warn!(command = name, "Failed to record command usage: {}", e);
    }
}

async fn reply_to_direct_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    match data.store.info_message()? {
        Some(text) => {
            message.channel_id.say(ctx, text).await?;
        }
        None => debug!(user = %message.author.id, "No info message set for direct messages"),
    }
    Ok(())
}

/// Runs a handler, reporting its error to the debug channel.
async fn run_command(command: Command, ctx: CommandContext) {
    debug!(command = %command.name, user = %ctx.author().id, "Running command");
    if let Err(err) = command.invoke(ctx.clone()).await {
        error!(command = %command.name, "Command failed: {}", err);
        let header = report::describe_invocation(&ctx).await;
        report::send_debug_report(
            &ctx.serenity,
            &ctx.data,
            &report::format_error_report(&header, err.as_ref()),
            &report::format_malformed_notice(&header),
        )
        .await;
    }
}
