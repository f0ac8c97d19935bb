//! Commands reserved for the bot administrator.

use crate::embeds;
use crate::framework::{CommandContext, CommandResult};
use crate::permissions::Permission;
use crate::registry::{Command, CommandRegistry};
use poise::serenity_prelude as serenity;
use sickle_common::GuildId;
use sickle_store::{DocumentStore, StoreResult};
use tracing::{info, warn};

const MODULE: &str = "admin";

/// Commands of this module.
pub fn commands() -> Vec<Command> {
    let admin = |command: Command| command.module(MODULE).permission(Permission::Administrator);
    vec![
        admin(Command::new("kill", kill))
            .anywhere()
            .example("kill")
            .help("Shuts the bot down."),
        admin(Command::new("feed.ping", feed_ping))
            .example("feed.ping")
            .help("Checks that the feed server answers."),
        admin(Command::new("bot.stats", bot_stats))
            .example("bot.stats")
            .help("Shows message and command counts for this server."),
        admin(Command::new("cmd.stats.all", command_stats))
            .example("cmd.stats.all")
            .help("Shows how often each public command has been used."),
        admin(Command::new("cmd.set.info", set_info))
            .example("cmd.set.info Hi! Use <<help in a server to see what I can do.")
            .help("Sets the reply sent to direct messages."),
        admin(Command::new("bot.set.dbg", toggle_debug))
            .example("bot.set.dbg")
            .help("Toggles debug mode, which moves the forum feed to its debug channel."),
    ]
}

/// Usage totals of every non-admin command, most used first.
pub fn command_usage(
    registry: &CommandRegistry,
    store: &DocumentStore,
) -> StoreResult<Vec<(String, u64)>> {
    let mut usage = registry
        .commands()
        .filter(|c| c.permission != Permission::Administrator)
        .map(|c| Ok((c.name.clone(), store.command_total(&c.name)?)))
        .collect::<StoreResult<Vec<_>>>()?;
    usage.sort_by(|(a_name, a), (b_name, b)| b.cmp(a).then_with(|| a_name.cmp(b_name)));
    Ok(usage)
}

async fn kill(ctx: CommandContext) -> CommandResult {
    info!(user = %ctx.author().id, "Shutdown requested");
    ctx.send_embed(embeds::info("Shutting down", "Goodbye!")).await?;

    if let Err(e) = ctx.data.feed.shutdown().await {
        warn!("Feed server did not acknowledge shutdown: {}", e);
    }
    ctx.data.runtime.request_shutdown();
    Ok(())
}

async fn feed_ping(ctx: CommandContext) -> CommandResult {
    let embed = match ctx.data.feed.ping().await {
        Ok(()) => embeds::success("Feed server", "The feed server is up."),
        Err(e) => embeds::error(format!("The feed server did not answer: {e}")),
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

async fn bot_stats(ctx: CommandContext) -> CommandResult {
    let guild = GuildId(ctx.guild_id()?.get());
    let embed = match ctx.data.store.bot_stats(guild)? {
        Some(stats) => embeds::info("Server statistics", "Counts since the bot joined.")
            .field("Messages", stats.total_msgs.to_string(), true)
            .field("From users", stats.user_msgs.to_string(), true)
            .field("Commands", stats.total_cmds.to_string(), true),
        None => embeds::info("Server statistics", "No statistics recorded yet."),
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

async fn command_stats(ctx: CommandContext) -> CommandResult {
    let usage = command_usage(&ctx.data.registry, &ctx.data.store)?;
    let lines = usage
        .iter()
        .map(|(name, total)| format!("`{name}`: {total}"))
        .collect::<Vec<_>>()
        .join("\n");
    ctx.send_embed(embeds::info("Command usage", lines)).await?;
    Ok(())
}

async fn set_info(ctx: CommandContext) -> CommandResult {
    let text = ctx.rest(0);
    if text.is_empty() {
        return ctx.send_command_help("cmd.set.info").await;
    }
    ctx.data.store.set_info_message(&text)?;
    ctx.send_embed(embeds::success("Info message", "Direct messages will now get this reply."))
        .await?;
    Ok(())
}

async fn toggle_debug(ctx: CommandContext) -> CommandResult {
    let enabled = ctx.data.runtime.toggle_debug();
    info!(debug = enabled, "Debug mode toggled");
    let embed = embeds::success(
        "Debug mode",
        format!("Debug mode is now {}.", if enabled { "on" } else { "off" }),
    )
    .footer(serenity::CreateEmbedFooter::new(format!(
        "Forum posts go to #{}",
        sickle_config::feed_channel_name(enabled)
    )));
    ctx.send_embed(embed).await?;
    Ok(())
}
