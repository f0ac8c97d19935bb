//! Embed builders shared by the built-in commands.

use crate::permissions::Permission;
use crate::registry::Command;
use poise::serenity_prelude as serenity;
use serenity::CreateEmbed;
use sickle_common::truncate_chars;
use sickle_relay::ForumReply;

/// Green used for successful actions.
pub const SUCCESS_COLOUR: u32 = 0x2e_cc_71;
/// Red used for failures and refusals.
pub const ERROR_COLOUR: u32 = 0xe7_4c_3c;
/// Blue used for informational replies.
pub const INFO_COLOUR: u32 = 0x34_98_db;

/// Embed description limit.
pub const DESCRIPTION_CHARS: usize = 4096;
const CODE_FENCE_CHARS: usize = "```\n\n```".len();

/// A green embed with a title and description.
pub fn success(title: impl Into<String>, description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .colour(SUCCESS_COLOUR)
}

/// A red embed describing what went wrong.
pub fn error(description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title("Error")
        .description(description)
        .colour(ERROR_COLOUR)
}

/// A blue embed with a title and description.
pub fn info(title: impl Into<String>, description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title(title)
        .description(description)
        .colour(INFO_COLOUR)
}

/// Refusal shown when the author lacks the command's permission level.
pub fn permission_denied(required: Permission) -> CreateEmbed {
    let who = match required {
        Permission::Anyone => "everyone",
        Permission::Moderator => "moderators",
        Permission::Administrator => "the bot administrator",
    };
    error(format!("This command is restricted to {who}."))
}

/// Help entry of a single command.
pub fn command_help(prefix: &str, command: &Command) -> CreateEmbed {
    let mut embed = info(
        format!("{prefix}{}", command.name),
        if command.help.is_empty() {
            "No description available.".to_string()
        } else {
            command.help.clone()
        },
    );
    if !command.example.is_empty() {
        embed = embed.field("Example", format!("`{prefix}{}`", command.example), false);
    }
    embed.footer(serenity::CreateEmbedFooter::new(format!(
        "Module: {} | Permission: {}",
        command.module,
        command.permission.as_str()
    )))
}

/// Reply to help requests for unknown commands.
pub fn no_such_command() -> CreateEmbed {
    error("No such command")
}

/// Module overview shown by `help` without arguments.
pub fn module_list<'a>(prefix: &str, modules: impl IntoIterator<Item = &'a str>) -> CreateEmbed {
    let list = modules
        .into_iter()
        .map(|m| format!("`{m}`"))
        .collect::<Vec<_>>()
        .join(", ");
    info(
        "Modules",
        format!(
            "{list}\n\nUse `{prefix}commands <module>` to list a module's commands \
             and `{prefix}help <command>` for details."
        ),
    )
}

/// Command names of one module.
pub fn module_commands(prefix: &str, module: &str, names: &[String]) -> CreateEmbed {
    let list = names
        .iter()
        .map(|n| format!("`{prefix}{n}`"))
        .collect::<Vec<_>>()
        .join("\n");
    info(format!("Commands in {module}"), list)
}

/// Periodic engagement post advertising a command.
pub fn did_you_know(prefix: &str, command: &Command) -> CreateEmbed {
    command_help(prefix, command).title(format!("Did you know? {prefix}{}", command.name))
}

/// Colour of a forum monitor reply: red for `-1`, green for `0`, purple otherwise.
pub fn forum_status_colour(status: i64) -> u32 {
    match status {
        -1 => 0x88_00_00,
        0 => 0x00_88_00,
        _ => 0x88_00_88,
    }
}

/// Forum monitor reply shown as a code block coloured by status.
pub fn forum_reply(reply: &ForumReply) -> CreateEmbed {
    let text = reply.text();
    let text = truncate_chars(&text, DESCRIPTION_CHARS - CODE_FENCE_CHARS);
    CreateEmbed::new()
        .colour(forum_status_colour(reply.status))
        .description(format!("```\n{text}\n```"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn to_json(embed: CreateEmbed) -> Value {
        serde_json::to_value(embed).unwrap()
    }

    fn sample() -> Command {
        Command::new("remind", |_ctx| async { Ok(()) })
            .module("reminders")
            .example("remind 10m stretch")
            .help("Reminds you of something later.")
    }

    #[test]
    fn test_command_help_includes_example_with_prefix() {
        let json = to_json(command_help("<<", &sample()));
        assert_eq!(json["title"], "<<remind");
        assert_eq!(json["description"], "Reminds you of something later.");
        assert_eq!(json["fields"][0]["name"], "Example");
        assert_eq!(json["fields"][0]["value"], "`<<remind 10m stretch`");
        assert_eq!(json["footer"]["text"], "Module: reminders | Permission: Anyone");
    }

    #[test]
    fn test_command_help_without_example_has_no_fields() {
        let command = Command::new("ping", |_ctx| async { Ok(()) });
        let json = to_json(command_help("!", &command));
        assert_eq!(json["description"], "No description available.");
        assert!(json["fields"].as_array().map_or(true, Vec::is_empty));
    }

    #[test]
    fn test_module_list() {
        let json = to_json(module_list("<<", ["admin", "utility"]));
        let description = json["description"].as_str().unwrap();
        assert!(description.starts_with("`admin`, `utility`"));
        assert!(description.contains("<<commands <module>"));
    }

    #[test]
    fn test_permission_denied_and_unknown() {
        let json = to_json(permission_denied(Permission::Moderator));
        assert_eq!(json["description"], "This command is restricted to moderators.");
        assert_eq!(to_json(no_such_command())["description"], "No such command");
    }

    fn reply(status: i64, msg: Option<Value>) -> ForumReply {
        ForumReply { status, msg }
    }

    #[test]
    fn test_forum_reply_colour_follows_status() {
        assert_eq!(to_json(forum_reply(&reply(-1, None)))["color"], 0x88_00_00);
        assert_eq!(to_json(forum_reply(&reply(0, None)))["color"], 0x00_88_00);
        assert_eq!(to_json(forum_reply(&reply(3, None)))["color"], 0x88_00_88);
    }

    #[test]
    fn test_forum_reply_is_code_fenced() {
        let json = to_json(forum_reply(&reply(0, Some(Value::from("3 threads")))));
        assert_eq!(json["description"], "```\n3 threads\n```");
        assert_eq!(to_json(forum_reply(&reply(-1, None)))["description"], "```\nFailed\n```");
    }

    #[test]
    fn test_forum_reply_fits_description_limit() {
        let long = Value::from("x".repeat(10_000));
        let json = to_json(forum_reply(&reply(0, Some(long))));
        let description = json["description"].as_str().unwrap();
        assert_eq!(description.chars().count(), DESCRIPTION_CHARS);
        assert!(description.ends_with("\n```"));
    }

    #[test]
    fn test_did_you_know_title() {
        let json = to_json(did_you_know("<<", &sample()));
        assert_eq!(json["title"], "Did you know? <<remind");
    }
}
