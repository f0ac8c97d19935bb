//! Background tasks: reminder delivery and engagement posts.

use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use sickle_commands::{embeds, Data};
use sickle_store::{DocumentStore, Reminder, StoreResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Text delivered for a reminder.
pub fn reminder_text(reminder: &Reminder) -> String {
    format!("<@{}> ⏰ {}", reminder.user, reminder.text)
}

/// Removes the reminders due at `now` and returns them for delivery.
pub fn collect_due(store: &DocumentStore, now: DateTime<Utc>) -> StoreResult<Vec<Reminder>> {
    Ok(store
        .take_due_reminders(now)?
        .into_iter()
        .map(|(_, reminder)| reminder)
        .collect())
}

/// Delivers due reminders every `period` until `shutdown` fires.
pub async fn run_reminder_poller(
    http: Arc<serenity::Http>,
    store: DocumentStore,
    period: Duration,
    shutdown: CancellationToken,
) {
    info!("Reminder poller started, checking every {}s", period.as_secs());
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let due = match collect_due(&store, Utc::now()) {
            Ok(due) => due,
            Err(e) => {
                warn!("Failed to read due reminders: {}", e);
                continue;
            }
        };

        for reminder in due {
            let channel = serenity::ChannelId::new(reminder.channel.get());
            // Already removed from the store, so a dead channel cannot wedge the poller
            if let Err(e) = channel.say(http.as_ref(), reminder_text(&reminder)).await {
                warn!(%channel, user = %reminder.user, "Failed to deliver reminder: {}", e);
            } else {
                debug!(%channel, user = %reminder.user, "Delivered reminder");
            }
        }
    }
    info!("Reminder poller stopped");
}

/// Posts a random public command's help to every bot channel each `period`.
pub async fn run_engagement(
    http: Arc<serenity::Http>,
    data: Data,
    period: Duration,
    shutdown: CancellationToken,
) {
    info!("Engagement posts enabled every {}h", period.as_secs() / 3600);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let channels = match data.store.bot_channels() {
            Ok(channels) => channels,
            Err(e) => {
                warn!("Failed to read bot channels: {}", e);
                continue;
            }
        };
        let Some(command) = data.registry.random_public() else {
            continue;
        };
        let embed = embeds::did_you_know(&data.prefix(), command);

        for (guild, channel) in channels {
            let channel = serenity::ChannelId::new(channel.get());
            let message = serenity::CreateMessage::new().embed(embed.clone());
            if let Err(e) = channel.send_message(http.as_ref(), message).await {
                warn!(%guild, %channel, "Failed to send engagement post: {}", e);
            }
        }
    }
    info!("Engagement task stopped");
}
