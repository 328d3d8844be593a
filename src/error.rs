//! Error types shared by the settings cache and the voice pipeline.

use serenity::model::id::ChannelId;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors produced while tracking channels or mutating settings.
#[derive(Error, Debug)]
pub enum VoiceError {
    /// The channel has no occupancy entry (it was never created by us, or is gone).
    #[error("channel {0} is not tracked")]
    NotFound(ChannelId),

    /// Writing the settings record failed; the cache was left untouched.
    #[error("failed to persist settings: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error(transparent)]
    ExternalApi(#[from] GatewayError),
}

impl VoiceError {
    /// Whether this is the "untracked channel" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for the voice pipeline.
pub type Result<T> = std::result::Result<T, VoiceError>;
