//! Bot runtime - gateway connection and shutdown.

use serenity::Client;
use serenity::model::gateway::GatewayIntents;
use tracing::{error, info};

use super::commands;
use super::dispatcher::AppState;
use super::handler::Handler;
use crate::config::Config;

/// Connect to Discord and run until the shards stop.
///
/// Ctrl+C removes commands from guilds with `remove-on-offline` set, then
/// shuts every shard down, which makes this return.
pub async fn run(config: &Config, state: AppState) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    let cleanup = state.clone();
    let mut client = Client::builder(&config.bot_token, intents)
        .event_handler(Handler::new(state))
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down...");
                let cleaned =
                    commands::remove_on_shutdown(&cleanup.settings, cleanup.gateway.as_ref()).await;
                if cleaned > 0 {
                    info!("Removed commands from {} guilds", cleaned);
                }
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    info!("Starting gateway connection...");
    client.start().await?;

    info!("Gateway connection closed");
    Ok(())
}
