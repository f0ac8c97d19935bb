//! Server roles and self-assignable roles.

use crate::embeds;
use crate::framework::{CommandContext, CommandResult, Error};
use crate::permissions::Permission;
use crate::registry::Command;
use poise::serenity_prelude as serenity;
use sickle_common::{truncate_chars, GuildId, RoleId};
use tracing::info;

const MODULE: &str = "roles";

/// Longest role list sent in one message.
pub const ROLE_LIST_CHARS: usize = 1800;

/// Commands of this module.
pub fn commands() -> Vec<Command> {
    let manage = serenity::Permissions::MANAGE_ROLES;
    vec![
        Command::new("createrole", create_role)
            .module(MODULE)
            .permission(Permission::Moderator)
            .requires(manage)
            .example("createrole mappers")
            .help("Creates a role unless one with that name already exists."),
        Command::new("destroyrole", destroy_role)
            .module(MODULE)
            .permission(Permission::Moderator)
            .requires(manage)
            .example("destroyrole mappers")
            .help("Deletes every role with that name."),
        Command::new("addselfrole", add_self_role)
            .module(MODULE)
            .permission(Permission::Moderator)
            .requires(manage)
            .example("addselfrole mappers")
            .help("Lets members give themselves an existing role with `togglerole`."),
        Command::new("delselfrole", del_self_role)
            .module(MODULE)
            .permission(Permission::Moderator)
            .requires(manage)
            .example("delselfrole mappers")
            .help("Stops a role from being self-assignable."),
        Command::new("togglerole", toggle_role)
            .module(MODULE)
            .example("togglerole mappers")
            .help("Gives you a self-assignable role, or takes it away if you have it."),
        Command::new("selfroles", self_roles)
            .module(MODULE)
            .example("selfroles")
            .help("Lists the self-assignable roles."),
        Command::new("roles", list_roles)
            .module(MODULE)
            .example("roles")
            .help("Lists the server's roles."),
    ]
}

/// One name per line in a code block. Lists longer than [`ROLE_LIST_CHARS`]
/// are cut and end with `...`.
pub fn format_role_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let joined = names.into_iter().collect::<Vec<_>>().join("\n");
    let shown = truncate_chars(&joined, ROLE_LIST_CHARS);
    let ellipsis = if shown.len() < joined.len() { "..." } else { "" };
    format!("```\n{shown}{ellipsis}\n```")
}

/// Role names are matched and created in lowercase.
pub fn normalize_role_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    (!name.is_empty()).then(|| name.to_lowercase())
}

fn role_name_arg(ctx: &CommandContext) -> Option<String> {
    normalize_role_name(&ctx.rest(0))
}

/// Guild roles whose lowercased name equals `name`.
async fn roles_named(ctx: &CommandContext, name: &str) -> Result<Vec<serenity::Role>, Error> {
    let roles = ctx.guild_id()?.roles(&ctx.serenity).await?;
    Ok(roles
        .into_values()
        .filter(|role| role.name.to_lowercase() == name)
        .collect())
}

async fn create_role(ctx: CommandContext) -> CommandResult {
    let Some(name) = role_name_arg(&ctx) else {
        return ctx.send_command_help("createrole").await;
    };

    if !roles_named(&ctx, &name).await?.is_empty() {
        ctx.send_embed(embeds::error(format!("A role named `{name}` already exists.")))
            .await?;
        return Ok(());
    }

    let guild_id = ctx.guild_id()?;
    let role = guild_id
        .create_role(&ctx.serenity, serenity::EditRole::new().name(&name))
        .await?;
    info!(guild = %guild_id, role = %role.id, "Created role {}", role.name);
    ctx.send_embed(embeds::success("Role created", format!("Created <@&{}>.", role.id)))
        .await?;
    Ok(())
}

async fn destroy_role(ctx: CommandContext) -> CommandResult {
    let Some(name) = role_name_arg(&ctx) else {
        return ctx.send_command_help("destroyrole").await;
    };
    let guild_id = ctx.guild_id()?;

    let matching = roles_named(&ctx, &name).await?;
    if matching.is_empty() {
        ctx.send_embed(embeds::error(format!("There is no role named `{name}`.")))
            .await?;
        return Ok(());
    }

    for role in &matching {
        guild_id.delete_role(&ctx.serenity, role.id).await?;
        ctx.data
            .store
            .remove_self_role_by_id(GuildId(guild_id.get()), RoleId(role.id.get()))?;
    }
    info!(guild = %guild_id, count = matching.len(), "Deleted roles named {}", name);
    ctx.send_embed(embeds::success(
        "Role deleted",
        format!("Deleted {} role(s) named `{name}`.", matching.len()),
    ))
    .await?;
    Ok(())
}

async fn add_self_role(ctx: CommandContext) -> CommandResult {
    let Some(name) = role_name_arg(&ctx) else {
        return ctx.send_command_help("addselfrole").await;
    };
    let guild = GuildId(ctx.guild_id()?.get());

    let Some(role) = roles_named(&ctx, &name).await?.into_iter().next() else {
        ctx.send_embed(embeds::error(format!("There is no role named `{name}`.")))
            .await?;
        return Ok(());
    };

    ctx.data
        .store
        .add_self_role(guild, RoleId(role.id.get()), &role.name)?;
    ctx.send_embed(embeds::success(
        "Self role added",
        format!("Members can now use `{}togglerole {name}`.", ctx.prefix()),
    ))
    .await?;
    Ok(())
}

async fn del_self_role(ctx: CommandContext) -> CommandResult {
    let Some(name) = role_name_arg(&ctx) else {
        return ctx.send_command_help("delselfrole").await;
    };
    let guild = GuildId(ctx.guild_id()?.get());

    let mut removed = 0;
    for role in roles_named(&ctx, &name).await? {
        removed += ctx
            .data
            .store
            .remove_self_role_by_id(guild, RoleId(role.id.get()))?;
    }
    // The role may have been renamed or deleted since it was added
    if removed == 0 {
        removed = ctx.data.store.remove_self_role_by_name(guild, &name)?;
    }

    let embed = if removed > 0 {
        embeds::success("Self role removed", format!("`{name}` is no longer self-assignable."))
    } else {
        embeds::error(format!("`{name}` is not a self-assignable role."))
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

async fn toggle_role(ctx: CommandContext) -> CommandResult {
    let Some(name) = role_name_arg(&ctx) else {
        return ctx.send_command_help("togglerole").await;
    };
    let guild_id = ctx.guild_id()?;

    let Some(self_role) = ctx
        .data
        .store
        .find_self_role(GuildId(guild_id.get()), &name)?
    else {
        ctx.send_embed(embeds::error(format!("`{name}` is not a self-assignable role.")))
            .await?;
        return Ok(());
    };

    let role_id = serenity::RoleId::new(self_role.role_id.get());
    let member = guild_id.member(&ctx.serenity, ctx.author().id).await?;
    let embed = if member.roles.contains(&role_id) {
        member.remove_role(&ctx.serenity, role_id).await?;
        embeds::success("Role removed", format!("You no longer have <@&{role_id}>."))
    } else {
        member.add_role(&ctx.serenity, role_id).await?;
        embeds::success("Role added", format!("You now have <@&{role_id}>."))
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

async fn self_roles(ctx: CommandContext) -> CommandResult {
    let guild = GuildId(ctx.guild_id()?.get());
    let roles = ctx.data.store.self_roles(guild)?;

    let embed = if roles.is_empty() {
        embeds::info("Self-assignable roles", "No self-assignable roles.")
    } else {
        embeds::info(
            "Self-assignable roles",
            format_role_list(roles.iter().map(|r| r.role_name.as_str())),
        )
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

async fn list_roles(ctx: CommandContext) -> CommandResult {
    let guild_id = ctx.guild_id()?;
    let mut roles: Vec<_> = guild_id
        .roles(&ctx.serenity)
        .await?
        .into_values()
        .filter(|role| role.id.get() != guild_id.get())
        .collect();
    roles.sort_by(|a, b| b.position.cmp(&a.position));

    ctx.send_embed(embeds::info(
        format!("Roles ({})", roles.len()),
        format_role_list(roles.iter().map(|r| r.name.as_str())),
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_list_is_truncated() {
        let names: Vec<String> = (0..500).map(|i| format!("role-{i}")).collect();
        let list = format_role_list(names.iter().map(String::as_str));
        assert!(list.starts_with("```\nrole-0\nrole-1\n"));
        assert!(list.ends_with("...\n```"));
        let body = list.trim_start_matches("```\n").trim_end_matches("...\n```");
        assert_eq!(body.chars().count(), ROLE_LIST_CHARS);
    }

    #[test]
    fn test_short_role_list_is_kept() {
        assert_eq!(format_role_list(["a", "b"]), "```\na\nb\n```");
    }

    #[test]
    fn test_role_names_are_lowercased() {
        assert_eq!(normalize_role_name("Map Makers").as_deref(), Some("map makers"));
        assert_eq!(normalize_role_name("  "), None);
    }

    #[test]
    fn test_managing_commands_require_manage_roles() {
        for command in commands() {
            if command.permission == Permission::Moderator {
                assert_eq!(command.requires, serenity::Permissions::MANAGE_ROLES, "{}", command.name);
            }
        }
    }
}
