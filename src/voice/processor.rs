//! Voice event processor.
//!
//! Turns membership transitions into tracker updates and channel
//! create/move/delete requests:
//!
//! | Transition | Channel           | Action                                |
//! |------------|-------------------|---------------------------------------|
//! | Join       | lobby             | spawn a channel and move the user in  |
//! | Join       | other             | increment                             |
//! | Leave      | lobby             | nothing                               |
//! | Leave      | other             | decrement (deletes when empty)        |
//! | Switch     | before (any)      | decrement                             |
//! | Switch     | after             | as Join                               |
//!
//! A switch decrements the channel it left even when that channel is the
//! lobby. The lobby is never tracked, so that step reports `NotFound`.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use rand::Rng;
use serenity::model::id::{ChannelId, UserId};
use tracing::{debug, info, warn};

use super::tracker::{Decrement, OccupancyGuard, OccupancyTracker};
use super::transition::{TransitionKind, VoiceTransition};
use crate::cache::SettingsCache;
use crate::database::GuildSetting;
use crate::error::{Result, VoiceError};
use crate::gateway::GatewayClient;

/// Why a transition produced no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The member is the bot itself.
    OwnUser,
    /// The member stayed in the same channel.
    NotATransition,
    /// The guild has never been configured.
    Unconfigured,
    /// The guild has the feature switched off.
    Disabled,
}

/// What happened to the channel the member left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Left the lobby, which is not tracked.
    Lobby,
    /// Left a managed channel.
    Managed(Decrement),
}

/// What happened to the channel the member entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Entered the lobby; a new channel was created and the member moved in.
    Spawned(ChannelId),
    /// Entered a managed channel, which now has this many members.
    Managed(i64),
}

/// Per-step results of one handled transition.
#[derive(Debug)]
pub struct TransitionReport {
    pub kind: TransitionKind,
    pub departure: Option<Result<Departure>>,
    pub arrival: Option<Result<Arrival>>,
}

/// Outcome of processing one transition.
#[derive(Debug)]
pub enum Outcome {
    Ignored(IgnoreReason),
    Handled(TransitionReport),
}

/// Drives ephemeral channels from voice membership transitions.
pub struct VoiceEventProcessor {
    settings: Arc<SettingsCache>,
    tracker: Arc<OccupancyTracker>,
    gateway: Arc<dyn GatewayClient>,
    bot_user: OnceCell<UserId>,
}

impl VoiceEventProcessor {
    pub fn new(
        settings: Arc<SettingsCache>,
        tracker: Arc<OccupancyTracker>,
        gateway: Arc<dyn GatewayClient>,
    ) -> Self {
        Self {
            settings,
            tracker,
            gateway,
            bot_user: OnceCell::new(),
        }
    }

    /// Record the bot's own user ID so its voice updates are skipped.
    ///
    /// Only the first call has an effect.
    pub fn set_bot_user(&self, user_id: UserId) {
        if self.bot_user.set(user_id).is_ok() {
            debug!("Ignoring voice updates from bot user {}", user_id);
        }
    }

    /// Process one transition.
    ///
    /// The tracker stays locked for the whole transition, so the departure
    /// and arrival steps of a switch are applied as one unit.
    pub async fn handle(&self, transition: VoiceTransition) -> Outcome {
        if self.bot_user.get() == Some(&transition.user_id) {
            return Outcome::Ignored(IgnoreReason::OwnUser);
        }

        let Some(kind) = transition.kind() else {
            return Outcome::Ignored(IgnoreReason::NotATransition);
        };

        let setting = match self.settings.get(transition.guild_id) {
            Some(s) if s.enabled => s,
            Some(_) => return Outcome::Ignored(IgnoreReason::Disabled),
            None => return Outcome::Ignored(IgnoreReason::Unconfigured),
        };

        let mut tracker = self.tracker.lock().await;
        let mut report = TransitionReport {
            kind,
            departure: None,
            arrival: None,
        };

        match (kind, transition.before, transition.after) {
            (TransitionKind::Join, _, Some(after)) => {
                report.arrival = Some(self.arrive(&mut tracker, &transition, &setting, after).await);
            }
            (TransitionKind::Leave, Some(before), _) => {
                report.departure = Some(if setting.is_lobby(before) {
                    Ok(Departure::Lobby)
                } else {
                    tracker.decrement(before).await.map(Departure::Managed)
                });
            }
            (TransitionKind::Switch, Some(before), Some(after)) => {
                report.departure = Some(tracker.decrement(before).await.map(Departure::Managed));
                report.arrival = Some(self.arrive(&mut tracker, &transition, &setting, after).await);
            }
            _ => {}
        }
        drop(tracker);

        log_report(&transition, &report);
        Outcome::Handled(report)
    }

    /// Arrival step shared by joins and switches.
    async fn arrive(
        &self,
        tracker: &mut OccupancyGuard<'_>,
        transition: &VoiceTransition,
        setting: &GuildSetting,
        channel_id: ChannelId,
    ) -> Result<Arrival> {
        if setting.is_lobby(channel_id) {
            self.spawn_channel(tracker, transition, setting)
                .await
                .map(Arrival::Spawned)
        } else {
            tracker.increment(channel_id).map(Arrival::Managed)
        }
    }

    /// Create a channel, track it at count 0 and move the member into it.
    ///
    /// The move produces its own switch event (lobby to the new channel),
    /// which brings the count to 1. If the move fails the channel is
    /// untracked and deleted.
    async fn spawn_channel(
        &self,
        tracker: &mut OccupancyGuard<'_>,
        transition: &VoiceTransition,
        setting: &GuildSetting,
    ) -> Result<ChannelId> {
        let name = channel_name(setting.effective_template());
        let channel_id = self
            .gateway
            .create_voice_channel(transition.guild_id, &name, setting.category)
            .await?;
        tracker.register(channel_id);

        if let Err(e) = self
            .gateway
            .move_member(transition.guild_id, transition.user_id, channel_id)
            .await
        {
            tracker.unregister(channel_id);
            if let Err(delete_err) = self.gateway.delete_channel(channel_id).await {
                warn!(channel = %channel_id, "Failed to clean up unused channel: {}", delete_err);
            }
            return Err(VoiceError::ExternalApi(e));
        }

        info!(
            guild = %transition.guild_id,
            user = %transition.user_id,
            channel = %channel_id,
            "Spawned voice channel '{}'", name
        );
        Ok(channel_id)
    }
}

/// Name for a new channel: `"{template} #{0..99}"`.
fn channel_name(template: &str) -> String {
    let suffix = rand::thread_rng().gen_range(0..100);
    format!("{} #{}", template, suffix)
}

/// Log failed steps. Untracked channels are routine (regular voice channels).
fn log_report(transition: &VoiceTransition, report: &TransitionReport) {
    let steps = [
        ("departure", report.departure.as_ref().and_then(|r| r.as_ref().err())),
        ("arrival", report.arrival.as_ref().and_then(|r| r.as_ref().err())),
    ];

    for (step, err) in steps {
        match err {
            None => {}
            Some(e) if e.is_not_found() => {
                debug!(guild = %transition.guild_id, kind = ?report.kind, "{} skipped: {}", step, e);
            }
            Some(e) => {
                warn!(
                    guild = %transition.guild_id,
                    user = %transition.user_id,
                    kind = ?report.kind,
                    "{} failed: {}", step, e
                );
            }
        }
    }
}
