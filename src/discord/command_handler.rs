use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use super::CommandInvocation;
use crate::gate::AllowList;
use crate::relay::{RelayFailure, RelayOutcome, RelayPayload, WebhookRelay};

pub const BOT_VERSION: &str = "1.1";

pub const PONG_REPLY: &str = "Pong!";
pub const ASK_REJECTED_REPLY: &str = "Sorry, this command is not enabled for this server.";
pub const ASK_ACCEPTED_REPLY: &str =
    "Your message has been received and is being processed! (This might take 10-15 seconds)";
pub const ASK_TIMEOUT_REPLY: &str = "The request to the service timed out. Please try again later.";

/// Option name shared by `echo` and `ask`.
pub const MESSAGE_OPTION: &str = "message";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Ping,
    Version,
    Echo,
    Ask,
}

impl BotCommand {
    pub const ALL: [BotCommand; 4] = [Self::Ping, Self::Version, Self::Echo, Self::Ask];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Version => "version",
            Self::Echo => "echo",
            Self::Ask => "ask",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Ping => "Replies with Pong!",
            Self::Version => "Replies with the bot version.",
            Self::Echo => "Echoes back your message.",
            Self::Ask => "Sends your question/message to the n8n workflow.",
        }
    }

    /// Description of the required `message` option, for commands that take one.
    pub fn message_option(self) -> Option<&'static str> {
        match self {
            Self::Echo => Some("The message to echo back"),
            Self::Ask => Some("Your question or message for the workflow"),
            Self::Ping | Self::Version => None,
        }
    }
}

/// The three ways a handler can talk back through an interaction.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    /// Immediate reply visible to the whole channel.
    async fn reply(&self, content: &str) -> Result<()>;
    /// Acknowledge now and promise a private follow-up.
    async fn defer_ephemeral(&self) -> Result<()>;
    /// Follow-up visible only to the invoking user.
    async fn followup_ephemeral(&self, content: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscordCommandOutcome {
    Replied(String),
    Rejected,
    Relayed(RelayOutcome),
    Unknown(String),
}

pub struct DiscordCommandHandler {
    relay: Arc<dyn WebhookRelay>,
    webhook_url: Url,
    allow_list: AllowList,
}

impl DiscordCommandHandler {
    pub fn new(relay: Arc<dyn WebhookRelay>, webhook_url: Url, allow_list: AllowList) -> Self {
        Self {
            relay,
            webhook_url,
            allow_list,
        }
    }

    /// Runs one invocation to completion. Errors only come from talking back to Discord.
    pub async fn handle(
        &self,
        invocation: &CommandInvocation,
        responder: &dyn InteractionResponder,
    ) -> Result<DiscordCommandOutcome> {
        let Some(command) = BotCommand::from_name(&invocation.name) else {
            debug!("ignoring unknown command /{}", invocation.name);
            return Ok(DiscordCommandOutcome::Unknown(invocation.name.clone()));
        };

        debug!(
            "command /{} from user_id={} channel_id={}",
            command.name(),
            invocation.user.id,
            invocation.channel.id
        );

        match command {
            BotCommand::Ask => self.handle_ask(invocation, responder).await,
            BotCommand::Ping => reply(responder, PONG_REPLY.to_string()).await,
            BotCommand::Version => reply(responder, version_reply()).await,
            BotCommand::Echo => {
                let message = invocation.message.as_deref().unwrap_or_default();
                reply(responder, echo_reply(message)).await
            }
        }
    }

    async fn handle_ask(
        &self,
        invocation: &CommandInvocation,
        responder: &dyn InteractionResponder,
    ) -> Result<DiscordCommandOutcome> {
        // Discord wants an answer within three seconds; the webhook may take up to fifteen.
        responder.defer_ephemeral().await?;

        let guild_id = invocation.guild.as_ref().map(|guild| guild.id);
        if !self.allow_list.permits_command(guild_id) {
            info!(
                "rejected /ask from user_id={} in guild {:?}",
                invocation.user.id, guild_id
            );
            responder.followup_ephemeral(ASK_REJECTED_REPLY).await?;
            return Ok(DiscordCommandOutcome::Rejected);
        }

        let payload = RelayPayload::from_command(invocation);
        let outcome = self.relay.relay(&self.webhook_url, &payload).await;

        responder.followup_ephemeral(&ask_followup(&outcome)).await?;
        Ok(DiscordCommandOutcome::Relayed(outcome))
    }
}

async fn reply(
    responder: &dyn InteractionResponder,
    content: String,
) -> Result<DiscordCommandOutcome> {
    responder.reply(&content).await?;
    Ok(DiscordCommandOutcome::Replied(content))
}

pub fn version_reply() -> String {
    format!("ver. {BOT_VERSION}")
}

pub fn echo_reply(message: &str) -> String {
    format!("echo: {message}")
}

/// Private follow-up for a finished `/ask` relay.
pub fn ask_followup(outcome: &RelayOutcome) -> String {
    match outcome {
        RelayOutcome::Delivered { .. } => ASK_ACCEPTED_REPLY.to_string(),
        RelayOutcome::Failed(RelayFailure::Timeout) => ASK_TIMEOUT_REPLY.to_string(),
        RelayOutcome::Failed(RelayFailure::Connection(detail)) => format!(
            "Could not connect to the service. Please try again later. Error: {detail}"
        ),
        RelayOutcome::Failed(RelayFailure::Service { status, .. }) => format!(
            "Failed to send message to the service. Error code: {status}. Please try again later."
        ),
        RelayOutcome::Failed(RelayFailure::Unknown(detail)) => format!(
            "An unexpected error occurred. Please inform the bot administrator. Error: {detail}"
        ),
    }
}
