//! Shared connection handle.
//!
//! One `ConnectionHandle` exists per live session. The registry, the
//! listener task and command handlers all hold it through an `Arc`; the
//! outbound queue is the only way to write to the socket.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use irc_proto::Command;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use super::event::{Event, EventKind};
use super::lifecycle::{Lifecycle, LifecycleState};
use crate::casemap::{irc_eq, irc_lower};
use crate::error::SendError;

/// Opaque connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub struct ConnectionHandle {
    pub id: ConnectionId,
    /// Label the connection was initiated with.
    pub label: String,
    /// `host:port` of the remote server.
    pub address: String,
    /// Channels joined once registered.
    pub autojoin: Vec<String>,
    pub connected_at: DateTime<Utc>,
    nick: RwLock<String>,
    /// Case-folded channel name -> name as the server reported it.
    channels: DashMap<String, String>,
    lifecycle: Mutex<Lifecycle>,
    outbound: mpsc::Sender<Command>,
}

impl ConnectionHandle {
    /// Build a handle plus the receiving end of its outbound queue.
    pub fn new(
        label: impl Into<String>,
        address: impl Into<String>,
        nick: impl Into<String>,
        autojoin: Vec<String>,
        queue: usize,
    ) -> (Arc<Self>, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel(queue.max(1));
        let handle = Arc::new(Self {
            id: ConnectionId::new(),
            label: label.into(),
            address: address.into(),
            autojoin,
            connected_at: Utc::now(),
            nick: RwLock::new(nick.into()),
            channels: DashMap::new(),
            lifecycle: Mutex::new(Lifecycle::new()),
            outbound: tx,
        });
        (handle, rx)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.lock().state
    }

    pub fn is_registered(&self) -> bool {
        self.state() == LifecycleState::Registered
    }

    pub fn mark_connected(&self) -> bool {
        self.lifecycle.lock().connected()
    }

    pub fn mark_registered(&self) -> bool {
        self.lifecycle.lock().registered()
    }

    /// Detach all observers. True only for the first caller.
    pub fn mark_disconnected(&self) -> bool {
        self.lifecycle.lock().disconnected()
    }

    pub fn observes(&self, kind: EventKind) -> bool {
        self.lifecycle.lock().observes(kind)
    }

    // ------------------------------------------------------------------
    // Identity and membership
    // ------------------------------------------------------------------

    pub fn nick(&self) -> String {
        self.nick.read().clone()
    }

    pub fn set_nick(&self, nick: impl Into<String>) {
        *self.nick.write() = nick.into();
    }

    pub fn is_own_nick(&self, nick: &str) -> bool {
        irc_eq(&self.nick.read(), nick)
    }

    /// Joined channels, sorted.
    pub fn channels(&self) -> Vec<String> {
        let mut list: Vec<String> = self.channels.iter().map(|e| e.value().clone()).collect();
        list.sort_unstable_by_key(|c| irc_lower(c));
        list
    }

    /// Update the membership set from our own JOIN, PART and KICK.
    pub fn track_membership(&self, event: &Event) {
        match event {
            Event::Join { channel, nick } if self.is_own_nick(nick) => {
                self.channels.insert(irc_lower(channel), channel.clone());
            }
            Event::Part { channel, nick, .. } | Event::Kick { channel, nick, .. }
                if self.is_own_nick(nick) =>
            {
                self.channels.remove(&irc_lower(channel));
            }
            _ => {}
        }
    }

    /// How long ago the connection was established.
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.connected_at
    }

    // ------------------------------------------------------------------
    // Outbound actions
    // ------------------------------------------------------------------

    /// Queue a command without waiting for room.
    pub fn send(&self, command: Command) -> Result<(), SendError> {
        if self.state() == LifecycleState::Disconnected {
            return Err(SendError::Closed);
        }
        self.outbound.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }

    pub fn quit(&self, reason: impl Into<String>) -> Result<(), SendError> {
        self.send(Command::QUIT(Some(reason.into())))
    }

    pub fn join(&self, channel: impl Into<String>) -> Result<(), SendError> {
        let channel = middle_param(channel.into())?;
        self.send(Command::JOIN(channel, None, None))
    }

    pub fn part(&self, channel: impl Into<String>, reason: Option<String>) -> Result<(), SendError> {
        let channel = middle_param(channel.into())?;
        self.send(Command::PART(channel, reason))
    }

    pub fn notice(&self, target: impl Into<String>, text: impl Into<String>) -> Result<(), SendError> {
        let target = middle_param(target.into())?;
        self.send(Command::NOTICE(target, text.into()))
    }

    pub fn privmsg(&self, target: impl Into<String>, text: impl Into<String>) -> Result<(), SendError> {
        let target = middle_param(target.into())?;
        self.send(Command::PRIVMSG(target, text.into()))
    }
}

/// A target or channel must serialize as exactly one middle parameter.
fn middle_param(param: String) -> Result<String, SendError> {
    let valid = !param.is_empty()
        && !param.starts_with(':')
        && !param.contains([' ', '\r', '\n', '\0']);
    if valid {
        Ok(param)
    } else {
        Err(SendError::InvalidParameter(param))
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("address", &self.address)
            .field("nick", &*self.nick.read())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(queue: usize) -> (Arc<ConnectionHandle>, mpsc::Receiver<Command>) {
        ConnectionHandle::new("test", "127.0.0.1:6667", "bot", vec![], queue)
    }

    #[test]
    fn tracks_own_membership_only() {
        let (conn, _rx) = handle(4);
        conn.track_membership(&Event::Join {
            channel: "#Rust".into(),
            nick: "BOT".into(),
        });
        conn.track_membership(&Event::Join {
            channel: "#other".into(),
            nick: "alice".into(),
        });
        assert_eq!(conn.channels(), vec!["#Rust".to_string()]);

        conn.track_membership(&Event::Kick {
            channel: "#rust".into(),
            nick: "bot".into(),
            by: "op".into(),
            reason: None,
        });
        assert!(conn.channels().is_empty());
    }

    #[test]
    fn nick_change_affects_membership_matching() {
        let (conn, _rx) = handle(4);
        conn.set_nick("bot_");
        assert!(conn.is_own_nick("Bot_"));
        assert!(!conn.is_own_nick("bot"));
    }

    #[test]
    fn send_reports_full_queue() {
        let (conn, mut rx) = handle(1);
        conn.join("#a").unwrap();
        assert_eq!(conn.join("#b"), Err(SendError::QueueFull));
        assert_eq!(rx.try_recv().unwrap(), Command::JOIN("#a".into(), None, None));
    }

    #[test]
    fn channel_names_fold_rfc1459() {
        let (conn, _rx) = handle(4);
        conn.track_membership(&Event::Join {
            channel: "#Dev[1]".into(),
            nick: "bot".into(),
        });
        conn.track_membership(&Event::Part {
            channel: "#dev{1}".into(),
            nick: "BOT".into(),
            reason: None,
        });
        assert!(conn.channels().is_empty());
    }

    #[test]
    fn malformed_targets_are_rejected() {
        let (conn, mut rx) = handle(8);
        for target in ["", ":x", "net :x", "#a b", "#a\r\nQUIT"] {
            assert_eq!(
                conn.privmsg(target, "hi"),
                Err(SendError::InvalidParameter(target.to_string()))
            );
        }
        assert!(matches!(conn.join(""), Err(SendError::InvalidParameter(_))));
        assert!(matches!(conn.part("#a b", None), Err(SendError::InvalidParameter(_))));
        assert!(matches!(conn.notice(":alice", "x"), Err(SendError::InvalidParameter(_))));
        assert!(rx.try_recv().is_err());

        conn.privmsg("#rust", ":trailing text is fine").unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            Command::PRIVMSG("#rust".into(), ":trailing text is fine".into())
        );
    }

    #[test]
    fn send_after_disconnect_is_closed() {
        let (conn, _rx) = handle(4);
        conn.mark_connected();
        assert!(conn.mark_disconnected());
        assert_eq!(conn.notice("alice", "hi"), Err(SendError::Closed));
    }

    #[test]
    fn send_with_dropped_receiver_is_closed() {
        let (conn, rx) = handle(4);
        drop(rx);
        assert_eq!(conn.privmsg("#a", "hi"), Err(SendError::Closed));
    }
}
