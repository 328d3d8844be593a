//! Data models.

pub mod guild_setting;

pub use guild_setting::{GuildSetting, SettingsPatch};
