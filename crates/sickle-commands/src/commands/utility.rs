//! Help and liveness commands.

use crate::embeds;
use crate::framework::{CommandContext, CommandResult};
use crate::registry::Command;

const MODULE: &str = "utility";

/// Commands of this module.
pub fn commands() -> Vec<Command> {
    vec![
        Command::new("help", help)
            .module(MODULE)
            .example("help remind")
            .help("Lists the command modules, or shows help for one command."),
        Command::new("commands", list_commands)
            .module(MODULE)
            .example("commands roles")
            .help("Lists the commands of a module."),
        Command::new("ping", ping)
            .module(MODULE)
            .example("ping")
            .help("Checks that the bot is responding."),
    ]
}

async fn help(ctx: CommandContext) -> CommandResult {
    let prefix = ctx.prefix();
    let embed = match ctx.args.first() {
        None => embeds::module_list(&prefix, ctx.data.registry.modules()),
        Some(name) => {
            let name = name.strip_prefix(prefix.as_str()).unwrap_or(name);
            match ctx.data.registry.get(name) {
                Some(command) => embeds::command_help(&prefix, command),
                None => embeds::no_such_command(),
            }
        }
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

async fn list_commands(ctx: CommandContext) -> CommandResult {
    let Some(module) = ctx.args.first() else {
        return ctx.send_command_help("commands").await;
    };

    let embed = match ctx.data.registry.module_commands(module) {
        Some(names) => embeds::module_commands(&ctx.prefix(), module, names),
        None => embeds::error(format!(
            "No module named `{module}`. Use `{}help` to list modules.",
            ctx.prefix()
        )),
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

async fn ping(ctx: CommandContext) -> CommandResult {
    ctx.send_embed(embeds::success("Pong!", "Sickle is up and listening."))
        .await?;
    Ok(())
}
