//! Per-guild configuration for lobby channels.

use serenity::model::id::{ChannelId, GuildId};

/// Name used for spawned channels when the guild has not set a template.
pub const DEFAULT_NAME_TEMPLATE: &str = "VC";

/// Configuration of one guild.
///
/// A guild without a stored setting behaves as if the feature were disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSetting {
    pub guild_id: GuildId,

    /// Remove the bot's slash commands when it goes offline.
    pub remove_commands: bool,

    /// Voice channel whose entry spawns a new channel.
    pub lobby_channel: Option<ChannelId>,

    /// Category new channels are created under.
    pub category: Option<ChannelId>,

    /// Base name of spawned channels (`"{template} #{n}"`).
    pub name_template: String,

    /// Whether channel spawning is active for this guild.
    pub enabled: bool,
}

impl GuildSetting {
    /// Zero-value setting for a guild that has never been configured.
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            remove_commands: false,
            lobby_channel: None,
            category: None,
            name_template: String::new(),
            enabled: false,
        }
    }

    /// Template to use for channel names, falling back to the default.
    pub fn effective_template(&self) -> &str {
        let template = self.name_template.trim();
        if template.is_empty() {
            DEFAULT_NAME_TEMPLATE
        } else {
            template
        }
    }

    /// Check if `channel_id` is this guild's lobby.
    pub fn is_lobby(&self, channel_id: ChannelId) -> bool {
        self.lobby_channel == Some(channel_id)
    }
}

/// A set of field changes applied to a [`GuildSetting`].
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub remove_commands: Option<bool>,
    /// `Some(None)` clears the lobby.
    pub lobby_channel: Option<Option<ChannelId>>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<ChannelId>>,
    pub name_template: Option<String>,
    pub enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn remove_commands(mut self, value: bool) -> Self {
        self.remove_commands = Some(value);
        self
    }

    #[must_use]
    pub fn lobby_channel(mut self, channel: Option<ChannelId>) -> Self {
        self.lobby_channel = Some(channel);
        self
    }

    #[must_use]
    pub fn category(mut self, category: Option<ChannelId>) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn name_template(mut self, template: impl Into<String>) -> Self {
        self.name_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, value: bool) -> Self {
        self.enabled = Some(value);
        self
    }

    /// Combine with a later patch; fields set in `later` win.
    #[must_use]
    pub fn then(self, later: SettingsPatch) -> Self {
        Self {
            remove_commands: later.remove_commands.or(self.remove_commands),
            lobby_channel: later.lobby_channel.or(self.lobby_channel),
            category: later.category.or(self.category),
            name_template: later.name_template.or(self.name_template),
            enabled: later.enabled.or(self.enabled),
        }
    }

    /// Apply the patch to a working copy.
    pub fn apply(&self, setting: &mut GuildSetting) {
        if let Some(value) = self.remove_commands {
            setting.remove_commands = value;
        }
        if let Some(channel) = self.lobby_channel {
            setting.lobby_channel = channel;
        }
        if let Some(category) = self.category {
            setting.category = category;
        }
        if let Some(template) = &self.name_template {
            setting.name_template = template.clone();
        }
        if let Some(value) = self.enabled {
            setting.enabled = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_untouched_fields() {
        let mut setting = GuildSetting::new(GuildId::new(1));
        setting.lobby_channel = Some(ChannelId::new(10));
        setting.name_template = "Room".to_string();

        SettingsPatch::new().enabled(true).apply(&mut setting);

        assert!(setting.enabled);
        assert_eq!(setting.lobby_channel, Some(ChannelId::new(10)));
        assert_eq!(setting.name_template, "Room");
    }

    #[test]
    fn test_later_patch_wins() {
        let patch = SettingsPatch::new()
            .enabled(true)
            .name_template("A")
            .then(SettingsPatch::new().enabled(false))
            .then(SettingsPatch::new().category(Some(ChannelId::new(20))));

        assert_eq!(patch.enabled, Some(false));
        assert_eq!(patch.name_template.as_deref(), Some("A"));
        assert_eq!(patch.category, Some(Some(ChannelId::new(20))));
        assert_eq!(patch.lobby_channel, None);
    }

    #[test]
    fn test_clearing_lobby() {
        let mut setting = GuildSetting::new(GuildId::new(1));
        setting.lobby_channel = Some(ChannelId::new(10));

        SettingsPatch::new().lobby_channel(None).apply(&mut setting);

        assert_eq!(setting.lobby_channel, None);
    }

    #[test]
    fn test_default_template() {
        let mut setting = GuildSetting::new(GuildId::new(1));
        assert_eq!(setting.effective_template(), "VC");

        setting.name_template = "Squad".to_string();
        assert_eq!(setting.effective_template(), "Squad");
    }
}
