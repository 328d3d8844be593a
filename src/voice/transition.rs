//! Voice membership transitions.

use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::model::voice::VoiceState;

/// A member's move between voice channels, derived from a voice state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceTransition {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub before: Option<ChannelId>,
    pub after: Option<ChannelId>,
}

/// Kind of membership change a transition describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Join,
    Leave,
    Switch,
}

impl VoiceTransition {
    pub fn new(
        guild_id: GuildId,
        user_id: UserId,
        before: Option<ChannelId>,
        after: Option<ChannelId>,
    ) -> Self {
        Self {
            guild_id,
            user_id,
            before,
            after,
        }
    }

    /// Build a transition from a gateway voice state update.
    ///
    /// Returns `None` for updates outside a guild.
    pub fn from_states(old: Option<&VoiceState>, new: &VoiceState) -> Option<Self> {
        let guild_id = new.guild_id.or_else(|| old.and_then(|o| o.guild_id))?;
        Some(Self::new(
            guild_id,
            new.user_id,
            old.and_then(|o| o.channel_id),
            new.channel_id,
        ))
    }

    /// Classify the transition.
    ///
    /// Returns `None` when the channel did not change (mute, deafen, stream
    /// updates), which is not a membership change.
    pub fn kind(&self) -> Option<TransitionKind> {
        match (self.before, self.after) {
            (None, Some(_)) => Some(TransitionKind::Join),
            (Some(_), None) => Some(TransitionKind::Leave),
            (Some(before), Some(after)) if before != after => Some(TransitionKind::Switch),
            _ => None,
        }
    }
}
