//! Hooks that record every callback into a channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use slircbot::BotHooks;
use slircbot::connection::{ChatMessage, ConnectionHandle, Event};
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    Registered(String),
    Message(String, ChatMessage),
    Notice(String, ChatMessage),
    Event(String, Event),
    Disconnected(String, String),
}

pub struct RecordingHooks {
    tx: mpsc::UnboundedSender<HookEvent>,
}

pub struct HookLog {
    rx: mpsc::UnboundedReceiver<HookEvent>,
}

pub fn recording_hooks() -> (RecordingHooks, HookLog) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RecordingHooks { tx }, HookLog { rx })
}

impl RecordingHooks {
    fn record(&self, event: HookEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait]
impl BotHooks for RecordingHooks {
    async fn on_registered(&self, conn: &Arc<ConnectionHandle>) {
        self.record(HookEvent::Registered(conn.label.clone()));
    }

    async fn on_message_received(&self, conn: &Arc<ConnectionHandle>, message: &ChatMessage) {
        self.record(HookEvent::Message(conn.label.clone(), message.clone()));
    }

    async fn on_notice(&self, conn: &Arc<ConnectionHandle>, notice: &ChatMessage) {
        self.record(HookEvent::Notice(conn.label.clone(), notice.clone()));
    }

    async fn on_event(&self, conn: &Arc<ConnectionHandle>, event: &Event) {
        self.record(HookEvent::Event(conn.label.clone(), event.clone()));
    }

    async fn on_disconnected(&self, conn: &Arc<ConnectionHandle>, reason: &str) {
        self.record(HookEvent::Disconnected(
            conn.label.clone(),
            reason.to_string(),
        ));
    }
}

impl HookLog {
    pub async fn next(&mut self) -> anyhow::Result<HookEvent> {
        timeout(Duration::from_secs(5), self.rx.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("hooks dropped"))
    }

    /// Assert nothing further is recorded within `dur`.
    pub async fn assert_quiet(&mut self, dur: Duration) {
        if let Ok(Some(event)) = timeout(dur, self.rx.recv()).await {
            panic!("unexpected hook event: {event:?}");
        }
    }
}
