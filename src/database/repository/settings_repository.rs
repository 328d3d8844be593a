//! Guild settings repository.
//!
//! One document per guild in the `settings` collection. Writes always
//! replace the whole document.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::doc;
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId};
use tracing::{debug, warn};

use crate::database::models::GuildSetting;
use crate::database::{Database, SettingsStore};

/// Stored shape of a guild setting. Empty strings mean "unset".
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettingDocument {
    guild_id: String,
    #[serde(default)]
    remove_commands: bool,
    #[serde(default)]
    voice_id: String,
    #[serde(default)]
    category_id: String,
    #[serde(default)]
    voice_template_name: String,
    #[serde(default)]
    is_enabled: bool,
}

impl From<&GuildSetting> for SettingDocument {
    fn from(setting: &GuildSetting) -> Self {
        Self {
            guild_id: setting.guild_id.to_string(),
            remove_commands: setting.remove_commands,
            voice_id: id_to_string(setting.lobby_channel),
            category_id: id_to_string(setting.category),
            voice_template_name: setting.name_template.clone(),
            is_enabled: setting.enabled,
        }
    }
}

impl SettingDocument {
    /// Convert back to the domain model. `None` if the guild ID is unusable.
    fn into_setting(self) -> Option<GuildSetting> {
        let guild_id = parse_id(&self.guild_id).map(GuildId::new)?;
        Some(GuildSetting {
            guild_id,
            remove_commands: self.remove_commands,
            lobby_channel: parse_id(&self.voice_id).map(ChannelId::new),
            category: parse_id(&self.category_id).map(ChannelId::new),
            name_template: self.voice_template_name,
            enabled: self.is_enabled,
        })
    }
}

fn id_to_string(id: Option<ChannelId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

/// Parse a snowflake; empty, malformed, and zero values are treated as unset.
fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id != 0)
}

/// Repository for guild settings.
pub struct SettingsRepository {
    collection: Collection<SettingDocument>,
}

impl SettingsRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("settings"),
        }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn upsert(&self, setting: &GuildSetting) -> Result<()> {
        let document = SettingDocument::from(setting);
        let filter = doc! { "guild_id": document.guild_id.as_str() };
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(filter, &document)
            .with_options(options)
            .await?;

        debug!("Saved settings for guild {}", setting.guild_id);
        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<GuildSetting>> {
        let mut cursor = self.collection.find(doc! {}).await?;
        let mut settings = Vec::new();

        while let Some(result) = cursor.next().await {
            let document = result?;
            let guild = document.guild_id.clone();
            match document.into_setting() {
                Some(setting) => settings.push(setting),
                None => warn!("Skipping settings document with invalid guild_id '{}'", guild),
            }
        }

        debug!("Loaded {} guild settings", settings.len());
        Ok(settings)
    }
}
