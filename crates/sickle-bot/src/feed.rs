//! Posts relayed scraper payloads into Discord.

use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage};
use sickle_commands::Data;
use sickle_common::ZERO_WIDTH_SPACE;
use sickle_config::feed_channel_name;
use sickle_relay::{content_chunks, AdminPost, ForumPost, RelayEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Embed for a forum post.
pub fn forum_post_embed(post: &ForumPost) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .colour(post.colour())
        .title(format!("Subforum: {}", post.subforum_name))
        .author(CreateEmbedAuthor::new(&post.username).url(post.user_url()))
        .thumbnail(post.avatar())
        .description(format!("[{}]({})", post.thread_title, post.post_url()))
        .footer(CreateEmbedFooter::new(&post.post_date));
    with_content_fields(embed, &post.contents)
}

/// Embed for an admin notice.
pub fn admin_post_embed(post: &AdminPost) -> CreateEmbed {
    let embed = CreateEmbed::new().title(format!("Source: {}", post.src));
    with_content_fields(embed, &post.contents)
}

fn with_content_fields(embed: CreateEmbed, contents: &str) -> CreateEmbed {
    content_chunks(contents)
        .into_iter()
        .fold(embed, |embed, chunk| {
            embed.field(ZERO_WIDTH_SPACE.to_string(), chunk, true)
        })
}

/// Consumes relay events and sends them to their channels.
pub struct FeedPoster {
    http: Arc<serenity::Http>,
    data: Data,
    channels: DashMap<&'static str, serenity::ChannelId>,
}

impl FeedPoster {
    /// Creates a poster sending through `http`.
    pub fn new(http: Arc<serenity::Http>, data: Data) -> Self {
        Self {
            http,
            data,
            channels: DashMap::new(),
        }
    }

    /// Runs until the relay channel closes or `shutdown` fires.
    pub async fn run(self, mut events: mpsc::Receiver<RelayEvent>, shutdown: CancellationToken) {
        info!("Feed poster started");
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let route = event.route();
            if let Err(e) = self.post(event).await {
                error!(route, "Failed to post relay event: {}", e);
            }
        }
        info!("Feed poster stopped");
    }

    async fn post(&self, event: RelayEvent) -> Result<(), ::serenity::Error> {
        match event {
            RelayEvent::Forum(post) => {
                let Some(channel) = self.feed_channel().await? else {
                    warn!(
                        "No #{} channel found, dropping post {}",
                        self.channel_name(),
                        post.post_id
                    );
                    return Ok(());
                };
                debug!(post_id = %post.post_id, %channel, "Posting forum post");
                let message = CreateMessage::new().embed(forum_post_embed(&post));
                channel.send_message(self.http.as_ref(), message).await?;
            }
            RelayEvent::Admin(post) => {
                let Some(channel) = self.data.debug_channel() else {
                    warn!(src = %post.src, "No debug channel configured, dropping admin post");
                    return Ok(());
                };
                let message = CreateMessage::new().embed(admin_post_embed(&post));
                channel.send_message(self.http.as_ref(), message).await?;
            }
        }
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        feed_channel_name(self.data.runtime.is_debug())
    }

    /// First channel with the feed name across the bot's guilds, cached by name.
    async fn feed_channel(&self) -> Result<Option<serenity::ChannelId>, ::serenity::Error> {
        let name = self.channel_name();
        if let Some(channel) = self.channels.get(name) {
            return Ok(Some(*channel));
        }

        for guild in self.http.get_guilds(None, None).await? {
            let channels = guild.id.channels(self.http.as_ref()).await?;
            let found = channels
                .values()
                .filter(|c| c.name == name)
                .min_by_key(|c| c.position)
                .map(|c| c.id);
            if let Some(channel) = found {
                info!(guild = %guild.id, %channel, "Using #{} for the forum feed", name);
                self.channels.insert(name, channel);
                return Ok(Some(channel));
            }
        }
        Ok(None)
    }
}
