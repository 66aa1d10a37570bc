use serde::Serialize;

use crate::discord::{
    ChannelScope, CommandInvocation, DiscordChannel, DiscordGuild, DiscordUser, ObservedMessage,
};

/// Stand-in for guild and channel fields outside a guild.
pub const DM_PLACEHOLDER: &str = "DM";

/// `source` marker on payloads coming from the passive listener.
pub const PASSIVE_SOURCE: &str = "passive_listener";

/// Flat JSON object posted to the n8n webhook.
///
/// Snowflakes are serialized as strings so JavaScript consumers keep full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayPayload {
    pub content: String,
    pub user_name: String,
    pub user_id: String,
    pub channel_name: String,
    pub channel_id: String,
    pub guild_name: String,
    pub guild_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
}

impl RelayPayload {
    pub fn from_command(invocation: &CommandInvocation) -> Self {
        Self::from_parts(
            invocation.message.clone().unwrap_or_default(),
            &invocation.user,
            &invocation.channel,
            invocation.guild.as_ref(),
        )
    }

    pub fn from_message(message: &ObservedMessage) -> Self {
        Self {
            message_url: Some(message.link.clone()),
            source: Some(PASSIVE_SOURCE),
            ..Self::from_parts(
                message.content.clone(),
                &message.author,
                &message.channel,
                message.guild.as_ref(),
            )
        }
    }

    fn from_parts(
        content: String,
        user: &DiscordUser,
        channel: &DiscordChannel,
        guild: Option<&DiscordGuild>,
    ) -> Self {
        let channel_name = match &channel.scope {
            ChannelScope::Guild { name } => name.clone(),
            ChannelScope::Direct => DM_PLACEHOLDER.to_string(),
        };

        // Without a cached guild there is no name to send, only the id.
        let (guild_name, guild_id) = match guild {
            Some(guild) => (
                guild
                    .name
                    .clone()
                    .unwrap_or_else(|| DM_PLACEHOLDER.to_string()),
                guild.id.to_string(),
            ),
            None => (DM_PLACEHOLDER.to_string(), DM_PLACEHOLDER.to_string()),
        };

        Self {
            content,
            user_name: user.name.clone(),
            user_id: user.id.to_string(),
            channel_name,
            channel_id: channel.id.to_string(),
            guild_name,
            guild_id,
            message_url: None,
            source: None,
        }
    }
}
