//! Discord implementation of the gateway over serenity's HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::CreateChannel;
use serenity::http::{Http, HttpError};
use serenity::model::channel::ChannelType;
use serenity::model::id::{ChannelId, GuildId, UserId};
use tracing::debug;

use super::{ApiErrorKind, GatewayClient, GatewayError};

/// Gateway backed by Discord's REST API.
#[derive(Clone)]
pub struct DiscordGateway {
    http: Arc<Http>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GatewayClient for DiscordGateway {
    async fn create_voice_channel(
        &self,
        guild_id: GuildId,
        name: &str,
        category_id: Option<ChannelId>,
    ) -> Result<ChannelId, GatewayError> {
        let mut builder = CreateChannel::new(name).kind(ChannelType::Voice);
        if let Some(category) = category_id {
            builder = builder.category(category);
        }

        let channel = guild_id
            .create_channel(&*self.http, builder)
            .await
            .map_err(classify)?;

        debug!(guild = %guild_id, channel = %channel.id, "Created voice channel '{}'", name);
        Ok(channel.id)
    }

    async fn move_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        channel_id: ChannelId,
    ) -> Result<(), GatewayError> {
        guild_id
            .move_member(&*self.http, user_id, channel_id)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), GatewayError> {
        channel_id.delete(&*self.http).await.map_err(classify)?;
        Ok(())
    }

    async fn delete_guild_commands(&self, guild_id: GuildId) -> Result<usize, GatewayError> {
        let commands = guild_id.get_commands(&*self.http).await.map_err(classify)?;

        for command in &commands {
            guild_id
                .delete_command(&*self.http, command.id)
                .await
                .map_err(classify)?;
            debug!(guild = %guild_id, "Deleted command /{}", command.name);
        }
        Ok(commands.len())
    }
}

/// Map a serenity error onto the gateway error classes.
fn classify(err: serenity::Error) -> GatewayError {
    let kind = match &err {
        serenity::Error::Http(http_err) => classify_http(http_err),
        serenity::Error::Gateway(_) | serenity::Error::Io(_) => ApiErrorKind::Transient,
        _ => ApiErrorKind::Other,
    };
    GatewayError::new(kind, err.to_string())
}

fn classify_http(err: &HttpError) -> ApiErrorKind {
    match err {
        HttpError::UnsuccessfulRequest(response) => kind_for_status(response.status_code.as_u16()),
        HttpError::Request(_) => ApiErrorKind::Transient,
        _ => ApiErrorKind::Other,
    }
}

fn kind_for_status(status: u16) -> ApiErrorKind {
    match status {
        429 => ApiErrorKind::RateLimited,
        401 | 403 => ApiErrorKind::Permission,
        404 => ApiErrorKind::Gone,
        s if s >= 500 => ApiErrorKind::Transient,
        _ => ApiErrorKind::Other,
    }
}
