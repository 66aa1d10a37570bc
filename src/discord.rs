use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::{debug, error, info};

use serenity::all::{
    ChannelType, Client as SerenityClient, Command, CommandInteraction, CommandOptionType,
    Context as SerenityContext, CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
    EventHandler as SerenityEventHandler, GatewayIntents, Http, Interaction,
    Message as SerenityMessage, PartialChannel, Ready,
};

use crate::config::{Config, ConfigError};

pub mod command_handler;
pub mod listener;

pub use self::command_handler::{
    BotCommand, DiscordCommandHandler, InteractionResponder, MESSAGE_OPTION,
};
pub use self::listener::PassiveListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordUser {
    pub id: u64,
    pub name: String,
    pub bot: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordGuild {
    pub id: u64,
    /// `None` when the guild is not in the cache.
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelScope {
    Guild { name: String },
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordChannel {
    pub id: u64,
    pub scope: ChannelScope,
}

/// A slash command as the handlers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    pub message: Option<String>,
    pub user: DiscordUser,
    pub channel: DiscordChannel,
    pub guild: Option<DiscordGuild>,
}

/// A regular channel message picked up by the passive listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedMessage {
    pub id: u64,
    pub content: String,
    pub author: DiscordUser,
    pub channel: DiscordChannel,
    pub guild: Option<DiscordGuild>,
    pub link: String,
}

struct GatewayEventHandler {
    commands: Arc<DiscordCommandHandler>,
    listener: Option<Arc<PassiveListener>>,
}

#[serenity::async_trait]
impl SerenityEventHandler for GatewayEventHandler {
    async fn ready(&self, ctx: SerenityContext, ready: Ready) {
        info!("logged in as {} ({})", ready.user.name, ready.user.id);

        match Command::set_global_commands(&ctx.http, command_definitions()).await {
            Ok(synced) => info!("synced {} command(s)", synced.len()),
            Err(err) => error!("error syncing commands: {err}"),
        }
    }

    async fn interaction_create(&self, ctx: SerenityContext, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let invocation = command_invocation(&ctx, &command);
        let responder = SerenityResponder {
            http: &ctx.http,
            command: &command,
        };

        match self.commands.handle(&invocation, &responder).await {
            Ok(outcome) => debug!("command /{} finished: {:?}", invocation.name, outcome),
            Err(err) => error!("failed to handle /{} command: {err}", invocation.name),
        }
    }

    async fn message(&self, ctx: SerenityContext, msg: SerenityMessage) {
        let Some(listener) = &self.listener else {
            return;
        };

        // The handle is dropped on purpose; the relay task logs its own outcome.
        let _ = listener.observe(&observed_message(&ctx, &msg));
    }
}

struct SerenityResponder<'a> {
    http: &'a Http,
    command: &'a CommandInteraction,
}

#[async_trait]
impl InteractionResponder for SerenityResponder<'_> {
    async fn reply(&self, content: &str) -> Result<()> {
        let response =
            CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().content(content));
        self.command
            .create_response(self.http, response)
            .await
            .map_err(|err| anyhow!("failed to send interaction response: {err}"))
    }

    async fn defer_ephemeral(&self) -> Result<()> {
        self.command
            .defer_ephemeral(self.http)
            .await
            .map_err(|err| anyhow!("failed to defer interaction: {err}"))
    }

    async fn followup_ephemeral(&self, content: &str) -> Result<()> {
        let followup = CreateInteractionResponseFollowup::new()
            .content(content)
            .ephemeral(true);
        self.command
            .create_followup(self.http, followup)
            .await
            .map(|_| ())
            .map_err(|err| anyhow!("failed to send interaction follow-up: {err}"))
    }
}

pub struct DiscordBot {
    config: Arc<Config>,
    commands: Arc<DiscordCommandHandler>,
    listener: Option<Arc<PassiveListener>>,
}

impl DiscordBot {
    pub fn new(
        config: Arc<Config>,
        commands: DiscordCommandHandler,
        listener: Option<PassiveListener>,
    ) -> Self {
        info!(
            "initializing discord bot (passive listener {})",
            if listener.is_some() { "enabled" } else { "disabled" }
        );
        Self {
            config,
            commands: Arc::new(commands),
            listener: listener.map(Arc::new),
        }
    }

    pub fn intents(&self) -> GatewayIntents {
        gateway_intents(
            self.config.auth.use_privileged_intents,
            self.listener.is_some(),
        )
    }

    /// Connects to the gateway and runs until the connection ends or Ctrl-C arrives.
    pub async fn run(&self) -> Result<()> {
        let token = self
            .config
            .auth
            .bot_token
            .as_ref()
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let event_handler = GatewayEventHandler {
            commands: self.commands.clone(),
            listener: self.listener.clone(),
        };

        let mut client = SerenityClient::builder(token.expose_secret(), self.intents())
            .event_handler(event_handler)
            .await
            .map_err(|err| anyhow!("failed to build discord gateway client: {err}"))?;

        let shard_manager = client.shard_manager.clone();

        tokio::select! {
            result = client.start() => {
                result.map_err(|err| anyhow!("discord gateway stopped: {err}"))?;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    error!("failed to listen for shutdown signal: {err}");
                }
                info!("bot shutting down by user interrupt");
                shard_manager.shutdown_all().await;
            }
        }

        Ok(())
    }
}

pub fn command_definitions() -> Vec<CreateCommand> {
    BotCommand::ALL
        .into_iter()
        .map(|command| {
            let definition = CreateCommand::new(command.name()).description(command.description());
            match command.message_option() {
                Some(description) => definition.add_option(
                    CreateCommandOption::new(CommandOptionType::String, MESSAGE_OPTION, description)
                        .required(true),
                ),
                None => definition,
            }
        })
        .collect()
}

fn gateway_intents(use_privileged_intents: bool, listener_enabled: bool) -> GatewayIntents {
    if use_privileged_intents {
        return GatewayIntents::all();
    }

    let mut intents = GatewayIntents::non_privileged();
    if listener_enabled {
        intents |= GatewayIntents::MESSAGE_CONTENT;
    }
    intents
}

fn command_invocation(ctx: &SerenityContext, command: &CommandInteraction) -> CommandInvocation {
    let message = command
        .data
        .options
        .iter()
        .find(|option| option.name == MESSAGE_OPTION)
        .and_then(|option| option.value.as_str())
        .map(str::to_string);

    CommandInvocation {
        name: command.data.name.clone(),
        message,
        user: DiscordUser {
            id: command.user.id.get(),
            name: command.user.name.clone(),
            bot: command.user.bot,
        },
        channel: DiscordChannel {
            id: command.channel_id.get(),
            scope: channel_scope(command.channel.as_ref()),
        },
        guild: command.guild_id.map(|guild_id| DiscordGuild {
            id: guild_id.get(),
            name: guild_id.name(&ctx.cache),
        }),
    }
}

fn observed_message(ctx: &SerenityContext, msg: &SerenityMessage) -> ObservedMessage {
    let scope = match msg.guild_id {
        Some(guild_id) => {
            let cached_name = ctx.cache.guild(guild_id).and_then(|guild| {
                guild
                    .channels
                    .get(&msg.channel_id)
                    .map(|channel| channel.name.clone())
            });
            guild_channel_scope(cached_name, msg.channel_id.get())
        }
        None => ChannelScope::Direct,
    };

    ObservedMessage {
        id: msg.id.get(),
        content: msg.content.clone(),
        author: DiscordUser {
            id: msg.author.id.get(),
            name: msg.author.name.clone(),
            bot: msg.author.bot,
        },
        channel: DiscordChannel {
            id: msg.channel_id.get(),
            scope,
        },
        guild: msg.guild_id.map(|guild_id| DiscordGuild {
            id: guild_id.get(),
            name: guild_id.name(&ctx.cache),
        }),
        link: msg.link(),
    }
}

/// Threads and channels missing from the guild cache go by their id.
fn guild_channel_scope(cached_name: Option<String>, channel_id: u64) -> ChannelScope {
    ChannelScope::Guild {
        name: cached_name.unwrap_or_else(|| channel_id.to_string()),
    }
}

/// Private and group DMs count as direct; so does anything Discord sent without a name.
fn channel_scope(channel: Option<&PartialChannel>) -> ChannelScope {
    match channel {
        Some(channel) if !matches!(channel.kind, ChannelType::Private | ChannelType::GroupDm) => {
            match &channel.name {
                Some(name) => ChannelScope::Guild { name: name.clone() },
                None => ChannelScope::Direct,
            }
        }
        _ => ChannelScope::Direct,
    }
}
