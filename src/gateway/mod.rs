//! Gateway module - the chat platform as seen by the voice pipeline.
//!
//! The processor and tracker only talk to the platform through
//! [`GatewayClient`], so they can run against Discord in production and
//! against a recording fake in tests.
//!
//! - `discord` - `GatewayClient` over serenity's HTTP client
//! - `retry` - Bounded exponential backoff decorator

mod discord;
mod retry;

use std::fmt;

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use thiserror::Error;

pub use discord::DiscordGateway;
pub use retry::{RetryPolicy, RetryingGateway};

/// Broad class of a failed platform request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Rejected by a rate limit (HTTP 429).
    RateLimited,
    /// Network failure or server-side error; worth retrying.
    Transient,
    /// Missing access or permissions (HTTP 401/403).
    Permission,
    /// The target no longer exists (HTTP 404).
    Gone,
    /// Anything else (bad request, decode failure, ...).
    Other,
}

impl ApiErrorKind {
    /// Whether a request failing this way should be retried.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Transient)
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RateLimited => "rate limited",
            Self::Transient => "transient",
            Self::Permission => "permission denied",
            Self::Gone => "not found",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A failed request to the chat platform.
#[derive(Error, Debug, Clone)]
#[error("gateway request failed ({kind}): {message}")]
pub struct GatewayError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Platform operations the voice pipeline needs.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Create a voice channel in `guild_id`, optionally under a category.
    async fn create_voice_channel(
        &self,
        guild_id: GuildId,
        name: &str,
        category_id: Option<ChannelId>,
    ) -> Result<ChannelId, GatewayError>;

    /// Move a member who is connected to voice into `channel_id`.
    async fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), GatewayError>;

    /// Delete a channel.
    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), GatewayError>;

    /// Delete every application command registered in `guild_id`,
    /// returning how many were removed.
    async fn delete_guild_commands(&self, guild_id: GuildId) -> Result<usize, GatewayError>;
}
