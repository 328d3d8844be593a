//! Persistence boundary for guild settings.

use anyhow::Result;
use async_trait::async_trait;

use super::models::GuildSetting;

/// Durable store of guild settings, keyed by guild ID.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Write the full record for `setting.guild_id`, inserting or replacing.
    async fn upsert(&self, setting: &GuildSetting) -> Result<()>;

    /// Load every stored setting.
    async fn query_all(&self) -> Result<Vec<GuildSetting>>;
}
