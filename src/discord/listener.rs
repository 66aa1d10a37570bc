use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span};
use url::Url;

use super::ObservedMessage;
use crate::gate::AllowList;
use crate::relay::{RelayPayload, WebhookRelay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerDecision {
    Forward,
    BotAuthor,
    DirectMessage,
    GuildNotAllowed(u64),
}

/// Forwards ordinary guild messages to the listener webhook in the background.
pub struct PassiveListener {
    relay: Arc<dyn WebhookRelay>,
    webhook_url: Url,
    allow_list: AllowList,
}

impl PassiveListener {
    pub fn new(relay: Arc<dyn WebhookRelay>, webhook_url: Url, allow_list: AllowList) -> Self {
        Self {
            relay,
            webhook_url,
            allow_list,
        }
    }

    pub fn screen(&self, message: &ObservedMessage) -> ListenerDecision {
        if message.author.bot {
            return ListenerDecision::BotAuthor;
        }

        let Some(guild) = &message.guild else {
            return ListenerDecision::DirectMessage;
        };

        if !self.allow_list.permits_listener(Some(guild.id)) {
            return ListenerDecision::GuildNotAllowed(guild.id);
        }

        ListenerDecision::Forward
    }

    /// Schedules the relay and returns immediately. The outcome is only logged;
    /// concurrent relays may finish in any order.
    pub fn observe(&self, message: &ObservedMessage) -> Option<JoinHandle<()>> {
        match self.screen(message) {
            ListenerDecision::Forward => {}
            decision => {
                debug!(
                    "listener skipped message_id={} decision={:?}",
                    message.id, decision
                );
                return None;
            }
        }

        let payload = RelayPayload::from_message(message);
        let relay = self.relay.clone();
        let url = self.webhook_url.clone();
        let span = info_span!(
            "passive_relay",
            message_id = message.id,
            channel_id = message.channel.id
        );

        Some(tokio::spawn(
            async move {
                let outcome = relay.relay(&url, &payload).await;
                debug!("passive relay finished delivered={}", outcome.is_delivered());
            }
            .instrument(span),
        ))
    }
}
