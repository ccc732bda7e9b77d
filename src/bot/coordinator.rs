//! Connection lifecycle coordinator.
//!
//! Receives each connection's lifecycle notifications and observed events
//! from its listener task. Chat messages go through the tokenizer and chat
//! router first; only lines that are not a recognized command reach the
//! generic message hook.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::Bot;
use crate::commands::{ChatContext, Outcome, ParsedCommand};
use crate::connection::{ChatMessage, ConnectionHandle, Event, EventSink};

pub(crate) struct Coordinator {
    bot: Arc<Bot>,
}

impl Coordinator {
    pub(crate) fn new(bot: Arc<Bot>) -> Self {
        Self { bot }
    }

    async fn chat_message(&self, conn: &Arc<ConnectionHandle>, message: ChatMessage) {
        if conn.is_own_nick(&message.source) {
            return;
        }

        let prefix = self.bot.config().bot.prefix_char();
        let Some(cmd) = ParsedCommand::tokenize(&message.text, prefix, &conn.nick()) else {
            self.bot.hooks().on_message_received(conn, &message).await;
            return;
        };

        debug!(label = %conn.label, command = %cmd.name, source = %message.source, "Chat command");
        let ctx = ChatContext::new(self.bot.clone(), conn.clone(), message);
        if self.bot.chat_router().dispatch(&ctx, &cmd).await == Outcome::Unrecognized {
            self.bot.hooks().on_message_received(conn, &ctx.message).await;
        }
    }
}

#[async_trait]
impl EventSink for Coordinator {
    async fn registered(&self, conn: &Arc<ConnectionHandle>) {
        for channel in &conn.autojoin {
            if let Err(e) = conn.join(channel.as_str()) {
                warn!(label = %conn.label, channel = %channel, error = %e, "Autojoin failed");
            }
        }
        self.bot.hooks().on_registered(conn).await;
    }

    async fn event(&self, conn: &Arc<ConnectionHandle>, event: Event) {
        match event {
            Event::ChannelMessage(message) | Event::QueryMessage(message) => {
                self.chat_message(conn, message).await;
            }
            Event::ChannelNotice(notice) | Event::QueryNotice(notice) => {
                self.bot.hooks().on_notice(conn, &notice).await;
            }
            other => self.bot.hooks().on_event(conn, &other).await,
        }
    }

    async fn disconnected(&self, conn: &Arc<ConnectionHandle>, reason: &str) {
        if let Some((label, _)) = self.bot.registry().remove_by_connection(conn) {
            debug!(label = %label, "Removed from registry");
        }
        self.bot.hooks().on_disconnected(conn, reason).await;
    }
}
