//! Main entry point for Sickle Bot.

use anyhow::Result;
use clap::Parser;
use sickle_bot::{startup, SickleBot};
use sickle_relay::{start_relay_server, RelayState};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overriding the configured level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = startup::load_config(args.config.as_deref(), args.log_level)?;
    let _log_guard = startup::init_logging(&config)?;
    info!("Starting Sickle Bot");

    let shutdown = CancellationToken::new();
    let store = startup::open_store(&config)?;
    let registry = startup::build_registry(&store)?;

    let (relay_state, relay_events) =
        RelayState::new(config.relay.channel_capacity, shutdown.child_token());
    let relay_task = if config.relay.enabled {
        let port = config.relay.api_port;
        Some(tokio::spawn(async move {
            if let Err(e) = start_relay_server(port, relay_state).await {
                error!("Relay server failed: {}", e);
            }
        }))
    } else {
        info!("Relay server disabled");
        None
    };

    let data = startup::build_data(config, store, registry, shutdown.clone());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal, starting graceful shutdown");
                signal_token.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signal: {:?}", e),
        }
    });

    let result = SickleBot::new(data, relay_events).run().await;

    shutdown.cancel();
    if let Some(task) = relay_task {
        let _ = task.await;
    }
    info!("Sickle Bot has shut down");
    Ok(result?)
}
