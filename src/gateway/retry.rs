//! Bounded exponential backoff for gateway requests.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serenity::model::id::{ChannelId, GuildId, UserId};
use tracing::warn;

use super::{GatewayClient, GatewayError};

/// Configuration for retrying failed gateway requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(2),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay following `delay`, with up to 25% jitter, capped at `max_delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        let base = delay.as_millis() as u64;
        let jitter = if base >= 4 {
            rand::thread_rng().gen_range(0..base / 4)
        } else {
            0
        };
        let next = ((base as f64 * self.backoff_factor) as u64 + jitter)
            .min(self.max_delay.as_millis() as u64);
        Duration::from_millis(next)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// attempts are exhausted. The last error is returned.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.kind.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "{} failed, retrying", what
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Gateway decorator that retries transient and rate-limited failures.
pub struct RetryingGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: GatewayClient> RetryingGateway<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<G: GatewayClient> GatewayClient for RetryingGateway<G> {
    async fn create_voice_channel(
        &self,
        guild_id: GuildId,
        name: &str,
        category_id: Option<ChannelId>,
    ) -> Result<ChannelId, GatewayError> {
        self.policy
            .run("create_voice_channel", move || {
                self.inner.create_voice_channel(guild_id, name, category_id)
            })
            .await
    }

    async fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), GatewayError> {
        self.policy
            .run("move_member", move || {
                self.inner.move_member(guild_id, user_id, channel_id)
            })
            .await
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), GatewayError> {
        self.policy
            .run("delete_channel", move || self.inner.delete_channel(channel_id))
            .await
    }

    async fn delete_guild_commands(&self, guild_id: GuildId) -> Result<usize, GatewayError> {
        self.policy
            .run("delete_guild_commands", move || {
                self.inner.delete_guild_commands(guild_id)
            })
            .await
    }
}
