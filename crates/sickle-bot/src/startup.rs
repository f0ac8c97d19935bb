//! Startup steps run by `main` before the gateway connects.

use crate::error::BotResult;
use sickle_commands::{all_commands, CommandRegistry, Data, RuntimeState};
use sickle_common::{init_logging as init_subscriber, LoggingConfig};
use sickle_config::{Config, ConfigCache, ConfigLoader};
use sickle_relay::{FeedClient, ForumClient};
use sickle_store::DocumentStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

/// Loads the configuration from `path` (or the default search locations)
/// and applies the command line log level override.
pub fn load_config(path: Option<&Path>, log_level: Option<String>) -> BotResult<Config> {
    let mut config = match path {
        Some(path) => ConfigLoader::load_config(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(level) = log_level {
        config.core.log_level = level;
    }
    Ok(config)
}

/// Installs the tracing subscriber. Keep the guard alive for the process.
pub fn init_logging(config: &Config) -> BotResult<Option<WorkerGuard>> {
    let guard = init_subscriber(LoggingConfig::from_settings(
        &config.core.log_level,
        config.core.log_path.clone(),
        config.core.is_debug,
    ))?;
    Ok(guard)
}

/// Opens the document store at the configured path.
pub fn open_store(config: &Config) -> BotResult<DocumentStore> {
    Ok(DocumentStore::open(&config.core.db_path)?)
}

/// Registers the built-in commands and the stored custom commands.
pub fn build_registry(store: &DocumentStore) -> BotResult<CommandRegistry> {
    let mut registry = CommandRegistry::new();
    registry.register_all(all_commands())?;
    registry.load_custom(store)?;
    info!("Registered {} commands", registry.commands().count());
    Ok(registry)
}

/// Assembles the state shared by every handler.
pub fn build_data(
    config: Config,
    store: DocumentStore,
    registry: CommandRegistry,
    shutdown: CancellationToken,
) -> Data {
    let relay = &config.relay;
    let feed = FeedClient::new(
        relay.feed_server_port,
        Duration::from_secs(relay.request_timeout_seconds),
    );
    let forum = ForumClient::new(
        relay.bot_forum_monitor_port,
        Duration::from_secs(relay.forum_timeout_seconds),
    );
    let runtime = RuntimeState::new(config.core.is_debug, shutdown);

    Data {
        config: Arc::new(ConfigCache::new(config)),
        store,
        registry: Arc::new(registry),
        feed,
        forum,
        runtime: Arc::new(runtime),
    }
}
