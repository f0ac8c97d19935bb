//! Shared bot data, the handler context, and the poise framework options.

use crate::dispatch;
use crate::registry::CommandRegistry;
use crate::report;
use poise::serenity_prelude as serenity;
use sickle_config::ConfigCache;
use sickle_relay::{FeedClient, ForumClient};
use sickle_store::DocumentStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Application error type for commands.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Result of a command handler.
pub type CommandResult = Result<(), Error>;

/// Framework context type passed to the event handler.
pub type FrameworkContext<'a> = poise::FrameworkContext<'a, Data, Error>;

/// Process-wide runtime flags.
#[derive(Debug)]
pub struct RuntimeState {
    debug: AtomicBool,
    shutdown: CancellationToken,
}

impl RuntimeState {
    /// Creates the runtime state with the configured debug flag.
    pub fn new(debug: bool, shutdown: CancellationToken) -> Self {
        Self {
            debug: AtomicBool::new(debug),
            shutdown,
        }
    }

    /// Whether debug mode is on.
    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Flips debug mode, returning the new value.
    pub fn toggle_debug(&self) -> bool {
        !self.debug.fetch_xor(true, Ordering::Relaxed)
    }

    /// Token cancelled when the bot should quit.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Requests shutdown of the whole process.
    pub fn request_shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Application data accessible in all commands. Cheap to clone.
#[derive(Clone)]
pub struct Data {
    /// Live configuration.
    pub config: Arc<ConfigCache>,
    /// Document store.
    pub store: DocumentStore,
    /// Built-in and custom commands.
    pub registry: Arc<CommandRegistry>,
    /// Feed server client.
    pub feed: FeedClient,
    /// Forum monitor client.
    pub forum: ForumClient,
    /// Debug flag and quit token.
    pub runtime: Arc<RuntimeState>,
}

impl Data {
    /// Current command prefix.
    pub fn prefix(&self) -> String {
        self.config.prefix()
    }

    /// Whether `user` is the configured bot admin.
    pub fn is_bot_admin(&self, user: serenity::UserId) -> bool {
        let admin = self.config.admin_user_id();
        admin.is_set() && admin.get() == user.get()
    }

    /// The configured debug channel, if set.
    pub fn debug_channel(&self) -> Option<serenity::ChannelId> {
        let channel = self.config.debug_channel_id();
        channel
            .is_set()
            .then(|| serenity::ChannelId::new(channel.get()))
    }
}

/// Everything a command handler gets to work with.
#[derive(Clone)]
pub struct CommandContext {
    /// Serenity context for API calls.
    pub serenity: serenity::Context,
    /// The invoking message.
    pub message: Arc<serenity::Message>,
    /// Shared bot data.
    pub data: Data,
    /// Name the command was invoked with.
    pub name: String,
    /// Whitespace-separated arguments after the name.
    pub args: Vec<String>,
}

impl CommandContext {
    /// Guild the command was sent in. Commands only run in guilds.
    pub fn guild_id(&self) -> Result<serenity::GuildId, Error> {
        self.message
            .guild_id
            .ok_or_else(|| "command used outside of a guild".into())
    }

    /// Channel the command was sent in.
    pub fn channel_id(&self) -> serenity::ChannelId {
        self.message.channel_id
    }

    /// Invoking user.
    pub fn author(&self) -> &serenity::User {
        &self.message.author
    }

    /// Current command prefix.
    pub fn prefix(&self) -> String {
        self.data.prefix()
    }

    /// Arguments joined back with single spaces.
    pub fn rest(&self, from: usize) -> String {
        self.args.get(from..).map(|a| a.join(" ")).unwrap_or_default()
    }

    /// Sends a plain message to the invoking channel.
    pub async fn say(&self, text: impl Into<String>) -> Result<serenity::Message, Error> {
        Ok(self.channel_id().say(&self.serenity, text).await?)
    }

    /// Sends an embed to the invoking channel.
    pub async fn send_embed(&self, embed: serenity::CreateEmbed) -> Result<serenity::Message, Error> {
        let message = serenity::CreateMessage::new().embed(embed);
        Ok(self.channel_id().send_message(&self.serenity, message).await?)
    }

    /// Replies with the help entry of `name`, used on bad arguments.
    pub async fn send_command_help(&self, name: &str) -> CommandResult {
        let prefix = self.prefix();
        let embed = match self.data.registry.get(name) {
            Some(command) => crate::embeds::command_help(&prefix, command),
            None => crate::embeds::no_such_command(),
        };
        self.send_embed(embed).await?;
        Ok(())
    }

    /// Logs a handler warning and forwards it to the debug channel.
    pub async fn warn(&self, text: impl AsRef<str>) {
        let text = text.as_ref();
        tracing::warn!(command = %self.name, "{}", text);
        let header = report::describe_invocation(self).await;
        report::send_debug_report(
            &self.serenity,
            &self.data,
            &report::format_warning(&header, text),
            &report::format_malformed_notice(&header),
        )
        .await;
    }
}

/// Builds the poise options. Prefix commands are dispatched by
/// [`dispatch::handle_event`] rather than poise's own parser.
pub fn create_framework_options() -> poise::FrameworkOptions<Data, Error> {
    poise::FrameworkOptions {
        commands: vec![],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: None,
            ..Default::default()
        },
        event_handler: |ctx, event, framework, data| {
            Box::pin(dispatch::handle_event(ctx, event, framework, data))
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_debug_returns_new_value() {
        let runtime = RuntimeState::new(false, CancellationToken::new());
        assert!(runtime.toggle_debug());
        assert!(runtime.is_debug());
        assert!(!runtime.toggle_debug());
        assert!(!runtime.is_debug());
    }

    #[test]
    fn test_request_shutdown_cancels_token() {
        let token = CancellationToken::new();
        let runtime = RuntimeState::new(true, token.clone());
        runtime.request_shutdown();
        assert!(token.is_cancelled());
    }
}
