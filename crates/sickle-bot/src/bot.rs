//! Core bot logic using the Poise framework.

use crate::error::BotResult;
use crate::feed::FeedPoster;
use crate::tasks;
use parking_lot::Mutex;
use poise::serenity_prelude as serenity;
use ::serenity::gateway::GatewayError;
use ::serenity::http::HttpError;
use sickle_commands::{create_framework_options, Data, Error};
use sickle_relay::RelayEvent;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_retry::RetryIf;
use tracing::{error, info, warn};

/// Growth of the delay between gateway login attempts.
pub const LOGIN_DELAY_STEP: Duration = Duration::from_secs(10);
/// Longest delay between gateway login attempts.
pub const MAX_LOGIN_DELAY: Duration = Duration::from_secs(120);

/// Retry strategy for gateway logins: 10 s, 20 s, ... capped at 2 minutes.
pub fn login_delays() -> impl Iterator<Item = Duration> {
    (1u32..).map(|attempt| LOGIN_DELAY_STEP.saturating_mul(attempt).min(MAX_LOGIN_DELAY))
}

/// Whether a client error is worth retrying. Authentication and intent
/// problems are not.
pub fn is_transient(err: &::serenity::Error) -> bool {
    match err {
        ::serenity::Error::Gateway(
            GatewayError::InvalidAuthentication
            | GatewayError::InvalidGatewayIntents
            | GatewayError::DisallowedGatewayIntents,
        ) => false,
        ::serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            !matches!(response.status_code.as_u16(), 401 | 403)
        }
        ::serenity::Error::Http(_)
        | ::serenity::Error::Io(_)
        | ::serenity::Error::Tungstenite(_)
        | ::serenity::Error::Gateway(_) => true,
        _ => false,
    }
}

/// Intents the dispatcher needs: guild and direct messages with their content.
pub fn gateway_intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT
}

/// How a gateway session ended.
enum Session {
    /// The client stopped on request.
    Stopped,
    /// A session that had reached Ready failed; logins start over.
    Dropped(::serenity::Error),
}

/// Main bot structure.
pub struct SickleBot {
    data: Data,
    relay_events: Arc<Mutex<Option<mpsc::Receiver<RelayEvent>>>>,
    connected: Arc<AtomicBool>,
}

impl SickleBot {
    /// Creates a bot that posts the given relay events once connected.
    pub fn new(data: Data, relay_events: mpsc::Receiver<RelayEvent>) -> Self {
        Self {
            data,
            relay_events: Arc::new(Mutex::new(Some(relay_events))),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Connects to the gateway and serves until shutdown is requested.
    ///
    /// Transient login failures are retried along [`login_delays`]; anything
    /// else ends the bot. The runtime's shutdown token is cancelled on return
    /// either way.
    pub async fn run(&self) -> BotResult<()> {
        let shutdown = self.data.runtime.shutdown_token().clone();
        let result = tokio::select! {
            _ = shutdown.cancelled() => Ok(()),
            result = self.serve() => result,
        };
        shutdown.cancel();
        result
    }

    async fn serve(&self) -> BotResult<()> {
        loop {
            let session = RetryIf::spawn(
                login_delays(),
                || self.session(),
                |e: &::serenity::Error| {
                    let retry = is_transient(e);
                    if retry {
                        warn!("Gateway connection failed, retrying: {}", e);
                    } else {
                        error!("Gateway login failed, not retrying: {}", e);
                    }
                    retry
                },
            )
            .await?;

            match session {
                Session::Stopped => {
                    info!("Gateway client stopped");
                    return Ok(());
                }
                Session::Dropped(e) => warn!("Gateway session ended: {}. Reconnecting", e),
            }
        }
    }

    async fn session(&self) -> Result<Session, ::serenity::Error> {
        match self.connect().await {
            Ok(()) => Ok(Session::Stopped),
            Err(e) if is_transient(&e) && self.connected.swap(false, Ordering::Relaxed) => {
                Ok(Session::Dropped(e))
            }
            Err(e) => Err(e),
        }
    }

    async fn connect(&self) -> Result<(), ::serenity::Error> {
        let token = self.data.config.get().core.discord_token.clone();
        let mut client = serenity::ClientBuilder::new(&token, gateway_intents())
            .framework(self.build_framework())
            .await?;

        let shard_manager = client.shard_manager.clone();
        let shutdown = self.data.runtime.shutdown_token().clone();
        let watcher = tokio::spawn(async move {
            shutdown.cancelled().await;
            info!("Shutting down gateway connection");
            shard_manager.shutdown_all().await;
        });

        info!("Sickle is connecting to Discord");
        let result = client.start().await;
        watcher.abort();
        result
    }

    fn build_framework(&self) -> poise::Framework<Data, Error> {
        let data = self.data.clone();
        let relay_events = self.relay_events.clone();
        let connected = self.connected.clone();

        poise::Framework::builder()
            .options(poise::FrameworkOptions {
                on_error: |error| Box::pin(on_error(error)),
                ..create_framework_options()
            })
            .setup(move |ctx, ready, _framework| {
                Box::pin(async move {
                    info!("Bot connected as: {}", ready.user.name);
                    info!("Connected to {} guilds", ready.guilds.len());
                    connected.store(true, Ordering::Relaxed);

                    ctx.set_presence(
                        Some(serenity::ActivityData::playing(format!("{}help", data.prefix()))),
                        serenity::OnlineStatus::Online,
                    );

                    // Reconnects reuse the tasks started on the first login
                    let events = relay_events.lock().take();
                    if let Some(events) = events {
                        spawn_background_tasks(ctx, &data, events);
                    }
                    Ok(data)
                })
            })
            .build()
    }
}

fn spawn_background_tasks(
    ctx: &serenity::Context,
    data: &Data,
    events: mpsc::Receiver<RelayEvent>,
) {
    let shutdown = data.runtime.shutdown_token().clone();
    let config = data.config.get();

    tokio::spawn(FeedPoster::new(ctx.http.clone(), data.clone()).run(events, shutdown.clone()));
    tokio::spawn(tasks::run_reminder_poller(
        ctx.http.clone(),
        data.store.clone(),
        config.tasks.reminder_poll_interval(),
        shutdown.clone(),
    ));
    if config.tasks.engagement_enabled {
        tokio::spawn(tasks::run_engagement(
            ctx.http.clone(),
            data.clone(),
            config.tasks.engagement_interval(),
            shutdown,
        ));
    }
}

/// Global error handler for the framework
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!(
                "Error in event handler for {}: {}",
                event.snake_case_name(),
                error
            );
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intents_include_message_content() {
        let intents = gateway_intents();
        assert!(intents.contains(serenity::GatewayIntents::MESSAGE_CONTENT));
        assert!(intents.contains(serenity::GatewayIntents::GUILD_MESSAGES));
        assert!(intents.contains(serenity::GatewayIntents::DIRECT_MESSAGES));
        assert!(!intents.contains(serenity::GatewayIntents::GUILD_MEMBERS));
    }

    #[test]
    fn test_login_delay_sequence() {
        let delays: Vec<u64> = login_delays().take(14).map(|d| d.as_secs()).collect();
        assert_eq!(
            delays,
            [10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120, 120, 120]
        );
    }

    #[test]
    fn test_transient_errors() {
        let io = ::serenity::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(is_transient(&io));
        assert!(is_transient(&::serenity::Error::Gateway(GatewayError::Closed(None))));
    }

    #[test]
    fn test_authentication_failures_abort() {
        assert!(!is_transient(&::serenity::Error::Gateway(
            GatewayError::InvalidAuthentication
        )));
        assert!(!is_transient(&::serenity::Error::Other("unexpected")));
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let attempts = std::sync::atomic::AtomicUsize::new(0);
        let result: Result<(), ::serenity::Error> = RetryIf::spawn(
            std::iter::repeat(Duration::ZERO),
            || {
                let attempt = attempts.fetch_add(1, Ordering::Relaxed);
                async move {
                    if attempt < 2 {
                        Err(::serenity::Error::Gateway(GatewayError::Closed(None)))
                    } else {
                        Err(::serenity::Error::Gateway(GatewayError::InvalidAuthentication))
                    }
                }
            },
            is_transient,
        )
        .await;

        assert!(matches!(
            result,
            Err(::serenity::Error::Gateway(GatewayError::InvalidAuthentication))
        ));
        assert_eq!(attempts.load(Ordering::Relaxed), 3);
    }
}
