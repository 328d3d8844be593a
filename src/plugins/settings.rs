//! Settings plugin.
//!
//! Handles `/set channel`, `/set activation` and `/set remove-on-offline`.

use serenity::all::{
    CommandInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
    ResolvedOption, ResolvedValue,
};
use serenity::model::id::ChannelId;
use tracing::{debug, info};

use crate::bot::dispatcher::AppState;
use crate::database::{GuildSetting, SettingsPatch};

/// A parsed `/set` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetCommand {
    Channel {
        lobby: ChannelId,
        /// Category the lobby itself sits in.
        lobby_parent: Option<ChannelId>,
        category: Option<ChannelId>,
        template: Option<String>,
    },
    Activation(bool),
    RemoveOnOffline(bool),
}

impl SetCommand {
    /// Parse the resolved options of a `/set` interaction.
    ///
    /// Returns `None` for unknown subcommands or missing required options.
    pub fn from_options(options: &[ResolvedOption<'_>]) -> Option<Self> {
        let sub = options.first()?;
        let ResolvedValue::SubCommand(args) = &sub.value else {
            return None;
        };

        match sub.name {
            "channel" => {
                let mut lobby = None;
                let mut category = None;
                let mut template = None;
                for arg in args {
                    match (arg.name, &arg.value) {
                        ("channel", ResolvedValue::Channel(channel)) => {
                            lobby = Some((channel.id, channel.parent_id));
                        }
                        ("category", ResolvedValue::Channel(channel)) => category = Some(channel.id),
                        ("template", ResolvedValue::String(text)) => {
                            template = Some(text.to_string())
                        }
                        _ => {}
                    }
                }
                let (lobby, lobby_parent) = lobby?;
                Some(Self::Channel {
                    lobby,
                    lobby_parent,
                    category,
                    template,
                })
            }
            "activation" => bool_arg(args).map(Self::Activation),
            "remove-on-offline" => bool_arg(args).map(Self::RemoveOnOffline),
            _ => None,
        }
    }

    /// Settings change for this command, given the guild's current setting.
    ///
    /// `set channel` without a category falls back to the lobby's own
    /// category, but only while the guild has none configured.
    pub fn patch(&self, current: Option<&GuildSetting>) -> SettingsPatch {
        match self {
            Self::Channel {
                lobby,
                lobby_parent,
                category,
                template,
            } => {
                let has_category = current.is_some_and(|s| s.category.is_some());
                let category = match (category, lobby_parent) {
                    (Some(_), _) => SettingsPatch::new().category(*category),
                    (None, Some(_)) if !has_category => SettingsPatch::new().category(*lobby_parent),
                    _ => SettingsPatch::new(),
                };
                let template = template
                    .as_ref()
                    .map(|t| SettingsPatch::new().name_template(t.clone()))
                    .unwrap_or_default();

                SettingsPatch::new()
                    .lobby_channel(Some(*lobby))
                    .then(category)
                    .then(template)
            }
            Self::Activation(enabled) => SettingsPatch::new().enabled(*enabled),
            Self::RemoveOnOffline(remove) => SettingsPatch::new().remove_commands(*remove),
        }
    }

    /// Quote-block body describing the updated setting.
    pub fn summary(&self, setting: &GuildSetting) -> String {
        match self {
            Self::Channel { .. } => format!(
                "Channel: {}\nCategory: {}\nTemplate: `{}`",
                mention(setting.lobby_channel),
                mention(setting.category),
                setting.effective_template(),
            ),
            Self::Activation(enabled) => format!("activation: {}", enabled),
            Self::RemoveOnOffline(remove) => format!("remove_on_offline: {}", remove),
        }
    }
}

fn bool_arg(args: &[ResolvedOption<'_>]) -> Option<bool> {
    args.iter().find_map(|arg| match (arg.name, &arg.value) {
        ("bool", ResolvedValue::Boolean(value)) => Some(*value),
        _ => None,
    })
}

fn mention(channel: Option<ChannelId>) -> String {
    match channel {
        Some(id) => format!("<#{}>", id),
        None => "`none`".to_string(),
    }
}

pub fn success_reply(summary: &str) -> String {
    format!("### Settings updated successfully. `✅`\n>>> {}", summary)
}

pub fn error_reply(reason: &str) -> String {
    format!("### Error! `❌`\n>>> {}", reason)
}

/// Handle the /set command.
pub async fn set_command(
    ctx: &Context,
    command: &CommandInteraction,
    state: &AppState,
) -> anyhow::Result<()> {
    let content = match command.guild_id {
        None => error_reply("This command can only be used in a server."),
        Some(guild_id) => match SetCommand::from_options(&command.data.options()) {
            None => error_reply("Unknown or incomplete subcommand."),
            Some(set) => {
                debug!(guild = %guild_id, "Applying {:?}", set);

                let update = state
                    .settings
                    .update_with(guild_id, |current| set.patch(current));
                match update.await {
                    Ok(setting) => {
                        info!(guild = %guild_id, user = %command.user.id, "Settings updated");
                        success_reply(&set.summary(&setting))
                    }
                    Err(e) => error_reply(&format!("Failed to update settings: {}", e)),
                }
            }
        },
    };

    let message = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(true);
    command
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SettingsCache;
    use crate::testing::MemoryStore;
    use serenity::model::id::GuildId;
    use std::sync::Arc;

    fn channel(id: u64) -> ChannelId {
        ChannelId::new(id)
    }

    fn configured(category: Option<u64>) -> GuildSetting {
        let mut setting = GuildSetting::new(GuildId::new(1));
        setting.category = category.map(channel);
        setting
    }

    fn set_channel(category: Option<u64>, template: Option<&str>) -> SetCommand {
        SetCommand::Channel {
            lobby: channel(10),
            lobby_parent: Some(channel(30)),
            category: category.map(channel),
            template: template.map(str::to_string),
        }
    }

    fn applied(command: &SetCommand, current: Option<&GuildSetting>) -> GuildSetting {
        let mut setting = current
            .cloned()
            .unwrap_or_else(|| GuildSetting::new(GuildId::new(1)));
        command.patch(current).apply(&mut setting);
        setting
    }

    #[tokio::test]
    async fn test_channel_patch_built_from_committed_setting() {
        let cache = SettingsCache::new(Arc::new(MemoryStore::new()));
        cache
            .update(GuildId::new(1), &SettingsPatch::new().category(Some(channel(20))))
            .await
            .unwrap();

        let set = set_channel(None, None);
        let setting = cache
            .update_with(GuildId::new(1), |current| set.patch(current))
            .await
            .unwrap();

        assert_eq!(setting.lobby_channel, Some(channel(10)));
        assert_eq!(setting.category, Some(channel(20)));
    }

    #[test]
    fn test_channel_uses_lobby_parent_for_new_guild() {
        let setting = applied(&set_channel(None, None), None);

        assert_eq!(setting.lobby_channel, Some(channel(10)));
        assert_eq!(setting.category, Some(channel(30)));
    }

    #[test]
    fn test_channel_keeps_existing_category() {
        let current = configured(Some(20));

        let setting = applied(&set_channel(None, None), Some(&current));

        assert_eq!(setting.category, Some(channel(20)));
    }

    #[test]
    fn test_explicit_category_wins() {
        let current = configured(Some(20));

        let setting = applied(&set_channel(Some(40), Some("Room")), Some(&current));

        assert_eq!(setting.category, Some(channel(40)));
        assert_eq!(setting.name_template, "Room");
    }

    #[test]
    fn test_toggles_touch_one_field() {
        let current = configured(Some(20));

        let enabled = applied(&SetCommand::Activation(true), Some(&current));
        assert!(enabled.enabled);
        assert!(!enabled.remove_commands);
        assert_eq!(enabled.category, Some(channel(20)));

        let remove = applied(&SetCommand::RemoveOnOffline(true), Some(&current));
        assert!(remove.remove_commands);
        assert!(!remove.enabled);
    }

    #[test]
    fn test_summary_and_reply() {
        let command = set_channel(None, None);
        let setting = applied(&command, None);

        let reply = success_reply(&command.summary(&setting));

        assert_eq!(
            reply,
            "### Settings updated successfully. `✅`\n>>> Channel: <#10>\nCategory: <#30>\nTemplate: `VC`"
        );
        assert_eq!(
            SetCommand::Activation(false).summary(&setting),
            "activation: false"
        );
    }

    #[test]
    fn test_summary_without_category() {
        let command = SetCommand::Channel {
            lobby: channel(10),
            lobby_parent: None,
            category: None,
            template: None,
        };
        let setting = applied(&command, None);

        assert!(command.summary(&setting).contains("Category: `none`"));
    }
}
