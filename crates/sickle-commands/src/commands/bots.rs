//! Commands talking to the companion scraper processes.

use crate::embeds;
use crate::framework::{CommandContext, CommandResult};
use crate::registry::Command;
use sickle_relay::ForumRequest;

const MODULE: &str = "bots";

/// Commands of this module.
pub fn commands() -> Vec<Command> {
    vec![Command::new("bot.forum", forum)
        .module(MODULE)
        .example("bot.forum Core.help")
        .help("Sends a command to the forum monitor, as `<bot>.<cmd> [args...]`, and posts its reply.")]
}

async fn forum(ctx: CommandContext) -> CommandResult {
    let Some(request) = ForumRequest::from_args(&ctx.args, ctx.author().id.get()) else {
        return ctx.send_command_help("bot.forum").await;
    };

    let reply = match ctx.data.forum.request(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            ctx.send_embed(embeds::error("The forum monitor did not answer."))
                .await?;
            ctx.warn(format!("Forum monitor request {}.{} failed: {e}", request.bot, request.cmd))
                .await;
            return Ok(());
        }
    };

    ctx.send_embed(embeds::forum_reply(&reply)).await?;
    Ok(())
}
