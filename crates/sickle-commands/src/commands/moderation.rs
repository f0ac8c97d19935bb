//! Channel toggles, bot channel and custom command management.

use crate::embeds;
use crate::framework::{CommandContext, CommandResult};
use crate::permissions::Permission;
use crate::registry::Command;
use poise::serenity_prelude as serenity;
use sickle_common::{ChannelId, GuildId};
use sickle_store::BotChannelChange;
use tracing::info;

const MODULE: &str = "moderation";

/// Commands of this module.
pub fn commands() -> Vec<Command> {
    vec![
        Command::new("bot.en", enable)
            .module(MODULE)
            .permission(Permission::Moderator)
            .anywhere()
            .example("bot.en false")
            .help("Enables or disables the bot's commands in this channel."),
        Command::new("bot.set.ch", set_channel)
            .module(MODULE)
            .permission(Permission::Moderator)
            .example("bot.set.ch")
            .help("Makes this channel the server's bot channel. Run it again in the same channel to clear it."),
        Command::new("bot.get.ch", get_channel)
            .module(MODULE)
            .example("bot.get.ch")
            .help("Shows the server's bot channel."),
        Command::new("bot.cmd.set", set_custom)
            .module(MODULE)
            .permission(Permission::Moderator)
            .example("bot.cmd.set rules Be nice to each other.")
            .help("Adds or replaces a custom command that replies with the given text."),
        Command::new("bot.cmd.rmv", remove_custom)
            .module(MODULE)
            .permission(Permission::Moderator)
            .example("bot.cmd.rmv rules")
            .help("Removes a custom command."),
    ]
}

/// Parses the argument of `bot.en`.
pub fn parse_toggle(arg: &str) -> Option<bool> {
    match arg.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Some(true),
        "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

async fn enable(ctx: CommandContext) -> CommandResult {
    let Some(enabled) = ctx.args.first().and_then(|a| parse_toggle(a)) else {
        return ctx.send_command_help("bot.en").await;
    };

    ctx.data
        .store
        .set_channel_enabled(ChannelId(ctx.channel_id().get()), enabled)?;
    info!(channel = %ctx.channel_id(), enabled, "Channel toggle changed");

    let state = if enabled { "enabled" } else { "disabled" };
    ctx.send_embed(embeds::success(
        "Channel updated",
        format!("Commands are now {state} in this channel."),
    ))
    .await?;
    Ok(())
}

async fn set_channel(ctx: CommandContext) -> CommandResult {
    let guild = GuildId(ctx.guild_id()?.get());
    let channel = ctx.channel_id();

    let description = match ctx
        .data
        .store
        .toggle_bot_channel(guild, ChannelId(channel.get()))?
    {
        BotChannelChange::Set { previous: None } => format!("Bot channel set to <#{channel}>."),
        BotChannelChange::Set {
            previous: Some(previous),
        } => format!("Bot channel moved from <#{previous}> to <#{channel}>."),
        BotChannelChange::Cleared => "Bot channel cleared.".to_string(),
    };
    ctx.send_embed(embeds::success("Bot channel", description))
        .await?;
    Ok(())
}

async fn get_channel(ctx: CommandContext) -> CommandResult {
    let guild = GuildId(ctx.guild_id()?.get());
    let Some(channel) = ctx.data.store.bot_channel(guild)? else {
        ctx.send_embed(embeds::info("Bot channel", "No bot channel set."))
            .await?;
        return Ok(());
    };

    let exists = serenity::ChannelId::new(channel.get())
        .to_channel(&ctx.serenity)
        .await
        .is_ok();
    let description = if exists {
        format!("The bot channel is <#{channel}>.")
    } else {
        "The bot channel no longer exists. Set a new one with `bot.set.ch`.".to_string()
    };
    ctx.send_embed(embeds::info("Bot channel", description))
        .await?;
    Ok(())
}

async fn set_custom(ctx: CommandContext) -> CommandResult {
    if ctx.args.len() < 2 {
        return ctx.send_command_help("bot.cmd.set").await;
    }
    let guild = GuildId(ctx.guild_id()?.get());
    let name = &ctx.args[0];
    let text = ctx.rest(1);

    if ctx.data.registry.is_builtin(name) {
        ctx.send_embed(embeds::error(format!("`{name}` is a built-in command.")))
            .await?;
        return Ok(());
    }

    ctx.data.store.set_custom_command(guild, name, &text)?;
    ctx.data.registry.set_custom(guild, name, &text)?;
    info!(%guild, name = %name, "Custom command set");

    ctx.send_embed(embeds::success(
        "Custom command saved",
        format!("`{}{name}` is ready.", ctx.prefix()),
    ))
    .await?;
    Ok(())
}

async fn remove_custom(ctx: CommandContext) -> CommandResult {
    let Some(name) = ctx.args.first() else {
        return ctx.send_command_help("bot.cmd.rmv").await;
    };
    let guild = GuildId(ctx.guild_id()?.get());

    if ctx.data.registry.is_builtin(name) {
        ctx.send_embed(embeds::error(format!("`{name}` is a built-in command.")))
            .await?;
        return Ok(());
    }

    let stored = ctx.data.store.remove_custom_command(guild, name)?;
    let cached = ctx.data.registry.remove_custom(guild, name)?;
    let embed = if stored || cached {
        info!(%guild, name = %name, "Custom command removed");
        embeds::success("Custom command removed", format!("`{name}` was removed."))
    } else {
        embeds::error(format!("There is no custom command named `{name}`."))
    };
    ctx.send_embed(embed).await?;
    Ok(())
}
