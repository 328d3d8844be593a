//! Serenity event handler.

use serenity::all::{Context, EventHandler, Guild, Interaction, Ready, UnavailableGuild, VoiceState};
use serenity::async_trait;
use tracing::{debug, info};

use super::commands;
use super::dispatcher::AppState;
use crate::plugins;
use crate::voice::VoiceTransition;

pub struct Handler {
    state: AppState,
}

impl Handler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            "Connected as {} ({} guilds)",
            ready.user.name,
            ready.guilds.len()
        );
        self.state.processor.set_bot_user(ready.user.id);
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        // Outages also arrive as guild deletes
        if incomplete.unavailable {
            debug!(guild = %incomplete.id, "Guild became unavailable");
            return;
        }

        info!(guild = %incomplete.id, "Left guild");
        commands::remove_guild_commands(
            &self.state.settings,
            self.state.gateway.as_ref(),
            incomplete.id,
        )
        .await;
    }

    async fn voice_state_update(&self, _ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        if let Some(transition) = VoiceTransition::from_states(old.as_ref(), &new) {
            self.state.voice_events.push(transition).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            plugins::command_handler(&ctx, &command, &self.state).await;
        }
    }
}
