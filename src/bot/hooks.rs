//! Embedder hooks.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::connection::{ChatMessage, ConnectionHandle, Event};

/// Callbacks invoked by the lifecycle coordinator. Every method defaults to
/// doing nothing.
///
/// `on_message_received` only sees lines that were not handled as chat
/// commands.
#[async_trait]
pub trait BotHooks: Send + Sync {
    async fn on_registered(&self, _conn: &Arc<ConnectionHandle>) {}

    async fn on_message_received(&self, _conn: &Arc<ConnectionHandle>, _message: &ChatMessage) {}

    async fn on_notice(&self, _conn: &Arc<ConnectionHandle>, _notice: &ChatMessage) {}

    /// Join, part, kick and mode changes.
    async fn on_event(&self, _conn: &Arc<ConnectionHandle>, _event: &Event) {}

    async fn on_disconnected(&self, _conn: &Arc<ConnectionHandle>, _reason: &str) {}
}

/// Default hooks: log through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHooks;

#[async_trait]
impl BotHooks for LogHooks {
    async fn on_registered(&self, conn: &Arc<ConnectionHandle>) {
        info!(label = %conn.label, nick = %conn.nick(), "Connection registered");
    }

    async fn on_message_received(&self, conn: &Arc<ConnectionHandle>, message: &ChatMessage) {
        debug!(
            label = %conn.label,
            source = %message.source,
            target = %message.target,
            text = %message.text,
            "Message"
        );
    }

    async fn on_notice(&self, conn: &Arc<ConnectionHandle>, notice: &ChatMessage) {
        debug!(label = %conn.label, source = %notice.source, text = %notice.text, "Notice");
    }

    async fn on_event(&self, conn: &Arc<ConnectionHandle>, event: &Event) {
        debug!(label = %conn.label, event = ?event, "Event");
    }

    async fn on_disconnected(&self, conn: &Arc<ConnectionHandle>, reason: &str) {
        info!(label = %conn.label, reason = %reason, "Connection closed");
    }
}
