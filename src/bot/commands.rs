//! Application command cleanup for guilds with `remove-on-offline` set.

use serenity::model::id::GuildId;
use tracing::{debug, info, warn};

use crate::cache::SettingsCache;
use crate::gateway::{GatewayClient, GatewayError};

/// Delete a guild's commands if its setting asks for it.
///
/// Returns `None` when the guild has no setting or the flag is off.
pub async fn remove_guild_commands(
    settings: &SettingsCache,
    gateway: &dyn GatewayClient,
    guild_id: GuildId,
) -> Option<Result<usize, GatewayError>> {
    if !settings.get(guild_id).is_some_and(|s| s.remove_commands) {
        debug!(guild = %guild_id, "Keeping commands, remove-on-offline is off");
        return None;
    }

    let result = gateway.delete_guild_commands(guild_id).await;
    match &result {
        Ok(count) => info!(guild = %guild_id, "Removed {} commands", count),
        Err(e) => warn!(guild = %guild_id, "Failed to remove commands: {}", e),
    }
    Some(result)
}

/// Remove commands from every guild that opted in. Returns the number of
/// guilds cleaned up successfully.
pub async fn remove_on_shutdown(settings: &SettingsCache, gateway: &dyn GatewayClient) -> usize {
    let mut cleaned = 0;
    for guild_id in settings.guilds_where(|s| s.remove_commands) {
        if let Some(Ok(_)) = remove_guild_commands(settings, gateway, guild_id).await {
            cleaned += 1;
        }
    }
    cleaned
}
