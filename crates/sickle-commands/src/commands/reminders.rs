//! Reminders delivered by the background poller.

use crate::embeds;
use crate::framework::{CommandContext, CommandResult};
use crate::registry::Command;
use chrono::{Duration, Utc};
use sickle_common::{format_timestamp, truncate_with_ellipsis, ChannelId, GuildId, UserId};
use sickle_store::Reminder;
use thiserror::Error;
use tracing::info;

const MODULE: &str = "reminders";

/// Furthest a reminder can be scheduled.
pub const MAX_REMINDER_DAYS: i64 = 365;

/// Commands of this module.
pub fn commands() -> Vec<Command> {
    vec![
        Command::new("remind", remind)
            .module(MODULE)
            .example("remind 1h30m check the oven")
            .help("Reminds you after a delay such as `90s`, `10m`, `1h30m` or `2d`."),
        Command::new("reminders", list_reminders)
            .module(MODULE)
            .example("reminders")
            .help("Lists your pending reminders in this server."),
        Command::new("remind.rmv", remove_reminder)
            .module(MODULE)
            .example("remind.rmv 1")
            .help("Deletes one of your pending reminders by its number in `reminders`."),
    ]
}

/// Why a reminder delay was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    /// Not a sequence of `<number><s|m|h|d>` parts
    #[error("`{0}` is not a duration like 90s, 10m, 1h30m or 2d")]
    Invalid(String),
    /// Zero length
    #[error("The delay must be longer than zero")]
    Empty,
    /// Beyond [`MAX_REMINDER_DAYS`]
    #[error("Reminders can be at most {MAX_REMINDER_DAYS} days away")]
    TooLong,
}

/// Parses delays such as `90s`, `10m`, `1h30m` or `2d`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());
    let input_lower = input.to_ascii_lowercase();

    let mut total: i64 = 0;
    let mut digits = String::new();
    for c in input_lower.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 24 * 60 * 60,
            _ => return Err(invalid()),
        };
        let amount: i64 = digits.parse().map_err(|_| invalid())?;
        digits.clear();
        total = amount
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or(DurationError::TooLong)?;
    }
    if !digits.is_empty() || input_lower.is_empty() {
        return Err(invalid());
    }

    if total == 0 {
        return Err(DurationError::Empty);
    }
    if total > MAX_REMINDER_DAYS * 24 * 60 * 60 {
        return Err(DurationError::TooLong);
    }
    Ok(Duration::seconds(total))
}

async fn remind(ctx: CommandContext) -> CommandResult {
    if ctx.args.len() < 2 {
        return ctx.send_command_help("remind").await;
    }
    let guild = GuildId(ctx.guild_id()?.get());

    let delay = match parse_duration(&ctx.args[0]) {
        Ok(delay) => delay,
        Err(e) => {
            ctx.send_embed(embeds::error(e.to_string())).await?;
            return Ok(());
        }
    };

    let now = Utc::now();
    let reminder = Reminder {
        channel: ChannelId(ctx.channel_id().get()),
        user: UserId(ctx.author().id.get()),
        guild: Some(guild),
        due: now + delay,
        text: ctx.rest(1),
        created: now,
    };
    let id = ctx.data.store.add_reminder(&reminder)?;
    info!(%id, user = %reminder.user, due = %reminder.due, "Reminder scheduled");

    ctx.send_embed(embeds::success(
        "Reminder set",
        format!("I'll remind you at {}.", format_timestamp(reminder.due)),
    ))
    .await?;
    Ok(())
}

async fn list_reminders(ctx: CommandContext) -> CommandResult {
    let guild = GuildId(ctx.guild_id()?.get());
    let user = UserId(ctx.author().id.get());
    let pending = ctx.data.store.reminders_for(user, Some(guild))?;

    let embed = if pending.is_empty() {
        embeds::info("Reminders", "You have no pending reminders.")
    } else {
        let lines = pending
            .iter()
            .enumerate()
            .map(|(i, (_, r))| {
                format!(
                    "{}. {} - {}",
                    i + 1,
                    format_timestamp(r.due),
                    truncate_with_ellipsis(&r.text, 100)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        embeds::info(format!("Reminders ({})", pending.len()), lines)
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

async fn remove_reminder(ctx: CommandContext) -> CommandResult {
    let Some(index) = ctx.args.first().and_then(|a| a.parse::<usize>().ok()) else {
        return ctx.send_command_help("remind.rmv").await;
    };
    let guild = GuildId(ctx.guild_id()?.get());
    let user = UserId(ctx.author().id.get());
    let pending = ctx.data.store.reminders_for(user, Some(guild))?;

    let embed = match index.checked_sub(1).and_then(|i| pending.get(i)) {
        Some((id, reminder)) => {
            ctx.data.store.remove_reminder(id)?;
            embeds::success(
                "Reminder deleted",
                format!("Deleted \"{}\".", truncate_with_ellipsis(&reminder.text, 100)),
            )
        }
        None => embeds::error(format!(
            "You have {} pending reminder(s); pick a number from `{}reminders`.",
            pending.len(),
            ctx.prefix()
        )),
    };
    ctx.send_embed(embed).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_units() {
        assert_eq!(parse_duration("90s"), Ok(Duration::seconds(90)));
        assert_eq!(parse_duration("10m"), Ok(Duration::minutes(10)));
        assert_eq!(parse_duration("2d"), Ok(Duration::days(2)));
    }

    #[test]
    fn test_compound_and_case() {
        assert_eq!(parse_duration("1h30m"), Ok(Duration::minutes(90)));
        assert_eq!(parse_duration("1D2H"), Ok(Duration::hours(26)));
    }

    #[test]
    fn test_invalid_input() {
        for bad in ["", "10", "m", "10x", "1h30", "-5m", "1.5h"] {
            assert!(
                matches!(parse_duration(bad), Err(DurationError::Invalid(_))),
                "{bad} should be invalid"
            );
        }
    }

    #[test]
    fn test_limits() {
        assert_eq!(parse_duration("0s"), Err(DurationError::Empty));
        assert_eq!(parse_duration("365d"), Ok(Duration::days(365)));
        assert_eq!(parse_duration("366d"), Err(DurationError::TooLong));
        assert_eq!(parse_duration("365d1s"), Err(DurationError::TooLong));
        assert_eq!(
            parse_duration("99999999999999999d"),
            Err(DurationError::TooLong)
        );
    }
}
