//! Configuration module for Lobbyist.
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::gateway::RetryPolicy;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub bot_token: String,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    /// Number of workers draining the voice event queue.
    pub voice_workers: usize,

    /// Capacity of the bounded voice event queue.
    pub voice_queue_capacity: usize,

    /// Backoff applied to gateway requests that fail transiently.
    pub retry: RetryPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if required environment variables are not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or("RETRY_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            initial_delay: Duration::from_millis(parse_or(
                "RETRY_INITIAL_DELAY_MS",
                defaults.initial_delay.as_millis() as u64,
            )),
            max_delay: Duration::from_millis(parse_or(
                "RETRY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )),
            ..defaults
        };

        Self {
            bot_token: env::var("BOT_TOKEN").expect("BOT_TOKEN must be set"),
            mongodb_uri: env::var("MONGODB_URI").expect("MONGODB_URI must be set"),
            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "lobbyist".to_string()),
            voice_workers: parse_or("VOICE_WORKERS", 4usize).max(1),
            voice_queue_capacity: parse_or("VOICE_QUEUE_CAPACITY", 256usize).max(1),
            retry,
        }
    }
}

/// Parse an optional variable, falling back when unset or malformed.
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
