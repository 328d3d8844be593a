//! Process-lifetime cache of guild settings.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serenity::model::id::GuildId;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::database::{GuildSetting, SettingsPatch, SettingsStore};
use crate::error::{Result, VoiceError};

/// In-memory view of every guild's settings, backed by a [`SettingsStore`].
///
/// Reads never touch the store. Writes go to the store first and only
/// reach the cache once persisted, so the cache always reflects a stored
/// state.
///
/// - Reads take the shared side of the `RwLock`.
/// - Updates are serialized by `write_lock` for their whole
///   read-modify-persist sequence, and take the exclusive side of the
///   `RwLock` only to commit.
pub struct SettingsCache {
    settings: RwLock<HashMap<GuildId, GuildSetting>>,
    write_lock: Mutex<()>,
    store: Arc<dyn SettingsStore>,
}

impl SettingsCache {
    /// Create an empty cache over `store`.
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
            store,
        }
    }

    /// Create a cache pre-filled with every stored setting.
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub async fn warm(store: Arc<dyn SettingsStore>) -> anyhow::Result<Self> {
        let cache = Self::new(store);
        let loaded = cache.store.query_all().await?;

        {
            let mut settings = cache.settings.write();
            for setting in loaded {
                settings.insert(setting.guild_id, setting);
            }
        }

        info!("Cached settings for {} guilds", cache.len());
        Ok(cache)
    }

    /// Get a guild's settings. Never creates an entry.
    pub fn get(&self, guild_id: GuildId) -> Option<GuildSetting> {
        self.settings.read().get(&guild_id).cloned()
    }

    /// Apply `patch` to a guild's settings and persist the full record.
    ///
    /// Starts from the cached setting, or a zero-value one for a guild seen
    /// for the first time. On persistence failure the cache is unchanged.
    pub async fn update(&self, guild_id: GuildId, patch: &SettingsPatch) -> Result<GuildSetting> {
        self.update_with(guild_id, |_| patch.clone()).await
    }

    /// Like [`update`](Self::update), with the patch built from the current
    /// setting while updates are locked out.
    pub async fn update_with<F>(&self, guild_id: GuildId, build: F) -> Result<GuildSetting>
    where
        F: FnOnce(Option<&GuildSetting>) -> SettingsPatch,
    {
        let _writer = self.write_lock.lock().await;

        let current = self.get(guild_id);
        let patch = build(current.as_ref());
        let mut working = current.unwrap_or_else(|| GuildSetting::new(guild_id));
        patch.apply(&mut working);

        if let Err(e) = self.store.upsert(&working).await {
            warn!(guild = %guild_id, "Settings update not persisted: {:#}", e);
            return Err(VoiceError::Persistence(e));
        }

        self.settings.write().insert(guild_id, working.clone());
        debug!(guild = %guild_id, "Settings updated: {:?}", working);

        Ok(working)
    }

    /// Guilds whose setting matches `predicate`.
    pub fn guilds_where(&self, predicate: impl Fn(&GuildSetting) -> bool) -> Vec<GuildId> {
        self.settings
            .read()
            .values()
            .filter(|s| predicate(s))
            .map(|s| s.guild_id)
            .collect()
    }

    /// Number of guilds with a cached setting.
    pub fn len(&self) -> usize {
        self.settings.read().len()
    }

    /// Check if no guild has a cached setting.
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.settings.read().is_empty()
    }
}

impl std::fmt::Debug for SettingsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsCache")
            .field("guild_count", &self.len())
            .finish()
    }
}
