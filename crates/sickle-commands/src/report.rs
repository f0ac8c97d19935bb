//! Error and warning reports sent to the debug channel.

use crate::framework::{CommandContext, Data};
use poise::serenity_prelude as serenity;
use sickle_common::{defuse_code_fences, truncate_chars};
use std::error::Error as StdError;
use tracing::{debug, error, warn};

/// Longest report body sent, leaving room for the fence under Discord's limit.
pub const REPORT_BODY_CHARS: usize = 1900;

/// `guild:#channel @author | "<prefix><cmd> <args>"`
pub fn invocation_header(
    guild: &str,
    channel: &str,
    author: &str,
    prefix: &str,
    name: &str,
    args: &[String],
) -> String {
    let mut invocation = format!("{prefix}{name}");
    if !args.is_empty() {
        invocation.push(' ');
        invocation.push_str(&args.join(" "));
    }
    format!("{guild}:#{channel} @{author} | \"{invocation}\"")
}

/// Report of a failed handler: the header, the error, then its source chain.
pub fn format_error_report(header: &str, err: &(dyn StdError + 'static)) -> String {
    let mut body = format!("{header}\nRaised {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        body.push_str(&format!("\nCaused by: {cause}"));
        source = cause.source();
    }
    fenced(&body)
}

/// Report of a handler warning.
pub fn format_warning(header: &str, text: &str) -> String {
    fenced(&format!("{header}\nWarning: {text}"))
}

/// Sent instead of a report Discord refused.
pub fn format_malformed_notice(header: &str) -> String {
    format!(
        "{}\nThe report for this invocation was malformed and could not be sent.",
        fenced(header)
    )
}

fn fenced(body: &str) -> String {
    let body = defuse_code_fences(body);
    format!("```\n{}\n```", truncate_chars(&body, REPORT_BODY_CHARS))
}

/// Builds the report header for a running command.
pub async fn describe_invocation(ctx: &CommandContext) -> String {
    let guild = ctx
        .message
        .guild_id
        .and_then(|id| id.name(&ctx.serenity))
        .unwrap_or_else(|| "DM".to_string());
    let channel = match ctx.channel_id().name(&ctx.serenity).await {
        Ok(name) => name,
        Err(_) => ctx.channel_id().to_string(),
    };
    invocation_header(
        &guild,
        &channel,
        &ctx.author().name,
        &ctx.prefix(),
        &ctx.name,
        &ctx.args,
    )
}

fn is_bad_request(err: &::serenity::Error) -> bool {
    matches!(
        err,
        ::serenity::Error::Http(::serenity::http::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 400
    )
}

/// Posts `text` to the debug channel, falling back to `fallback` when
/// Discord rejects the message as malformed.
pub async fn send_debug_report(ctx: &serenity::Context, data: &Data, text: &str, fallback: &str) {
    let Some(channel) = data.debug_channel() else {
        debug!("No debug channel configured, report dropped");
        return;
    };

    match channel.say(ctx, text).await {
        Ok(_) => {}
        Err(e) if is_bad_request(&e) => {
            warn!("Debug report rejected, sending notice instead: {}", e);
            if let Err(e) = channel.say(ctx, fallback).await {
                error!("Failed to send debug notice: {}", e);
            }
        }
        Err(e) => error!("Failed to send debug report: {}", e),
    }
}
