//! Chat-scope commands.
//!
//! Handlers here are bound to the connection and message a command arrived
//! on. Replies and error notifications go out as NOTICEs to the channel, or
//! to the sender for a private query.

mod builtin;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::router::{CommandContext, RouterBuilder};
use crate::bot::Bot;
use crate::connection::{ChatMessage, ConnectionHandle};
use crate::error::SendError;

pub use builtin::{HelpCommand, PingCommand, UptimeCommand, format_duration};

/// Context handed to chat command handlers.
pub struct ChatContext {
    pub bot: Arc<Bot>,
    pub conn: Arc<ConnectionHandle>,
    /// The message the command was parsed from.
    pub message: ChatMessage,
}

impl ChatContext {
    pub fn new(bot: Arc<Bot>, conn: Arc<ConnectionHandle>, message: ChatMessage) -> Self {
        Self { bot, conn, message }
    }

    /// NOTICE `text` back to where the command came from.
    pub fn reply(&self, text: impl Into<String>) -> Result<(), SendError> {
        self.conn.notice(self.message.reply_target(), text)
    }
}

#[async_trait]
impl CommandContext for ChatContext {
    async fn notify(&self, text: &str) {
        if let Err(e) = self.reply(text) {
            warn!(label = %self.conn.label, error = %e, "Could not send chat notification");
        }
    }
}

/// Router builder pre-loaded with `help`, `ping` and `uptime`.
pub fn builtin_commands() -> RouterBuilder<ChatContext> {
    RouterBuilder::new("chat")
        .register("help", HelpCommand)
        .register("ping", PingCommand)
        .register("uptime", UptimeCommand)
}
