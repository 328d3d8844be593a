//! Cache module - in-memory views over persisted data.
//!
//! ## Usage
//!
//! ```rust
//! let cache = SettingsCache::warm(store).await?;
//!
//! // Read (shared lock, never touches the store)
//! let setting = cache.get(guild_id);
//!
//! // Write (persisted first, then committed)
//! cache.update(guild_id, &SettingsPatch::new().enabled(true)).await?;
//! ```

mod settings;

pub use settings::SettingsCache;
