//! Lobbyist - Discord bot for on-demand voice channels
//!
//! Joining a guild's lobby channel creates a fresh voice channel and moves
//! the member into it; the channel is deleted once the last member leaves.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB integration
//! - `cache` - In-memory guild settings
//! - `gateway` - Discord HTTP operations with retry
//! - `voice` - Transition processing and occupancy tracking
//! - `bot` - Gateway connection, event queue and workers
//! - `plugins` - Slash command handlers

mod bot;
mod cache;
mod config;
mod database;
mod error;
mod gateway;
mod plugins;
mod voice;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use serenity::http::Http;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::{AppState, VoiceQueue};
use cache::SettingsCache;
use config::Config;
use database::{Database, SettingsRepository};
use gateway::{DiscordGateway, GatewayClient, RetryingGateway};
use voice::{OccupancyTracker, VoiceEventProcessor};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lobbyist=info,serenity=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Lobbyist bot...");

    let config = Config::from_env();
    info!("Configuration loaded successfully");

    // Connect to MongoDB
    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    info!("Database connected");

    let store = Arc::new(SettingsRepository::new(&db));
    let settings = Arc::new(SettingsCache::warm(store).await?);

    // Every create/move/delete goes through the retry layer
    let http = Arc::new(Http::new(&config.bot_token));
    let gateway: Arc<dyn GatewayClient> = Arc::new(RetryingGateway::new(
        DiscordGateway::new(http),
        config.retry.clone(),
    ));

    let tracker = Arc::new(OccupancyTracker::new(gateway.clone()));
    let processor = Arc::new(VoiceEventProcessor::new(
        settings.clone(),
        tracker,
        gateway.clone(),
    ));

    let (queue, _workers) = VoiceQueue::start(
        processor.clone(),
        config.voice_workers,
        config.voice_queue_capacity,
    );
    info!("Voice queue ready with {} workers", config.voice_workers);

    let state = AppState::new(settings, processor, queue, gateway);
    bot::run(&config, state).await?;

    info!("Lobbyist stopped");
    Ok(())
}
