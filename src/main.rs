#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod cli;
mod config;
mod discord;
mod gate;
mod relay;
mod utils;
mod web;

use cli::Cli;
use config::Config;
use discord::{DiscordBot, DiscordCommandHandler, PassiveListener};
use relay::{HttpRelay, RELAY_TIMEOUT, WebhookRelay};
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init_tracing();

    let cli = Cli::parse();
    let config = Arc::new(Config::load(cli.config.as_deref())?);
    info!("discord-n8n-relay starting up");

    let relay: Arc<dyn WebhookRelay> = Arc::new(HttpRelay::new(RELAY_TIMEOUT)?);

    let commands = DiscordCommandHandler::new(
        relay.clone(),
        config.ask_webhook_url()?.clone(),
        config.allow_list.clone(),
    );
    let listener = config.webhook.listener_url.clone().map(|url| {
        PassiveListener::new(relay.clone(), url, config.allow_list.clone())
    });

    let web_server = WebServer::new(config.clone());
    tokio::spawn(async move {
        if let Err(e) = web_server.start().await {
            error!("liveness server error: {}", e);
        }
    });

    let bot = DiscordBot::new(config.clone(), commands, listener);
    let result = bot.run().await;

    info!("bot has shut down");
    result
}
