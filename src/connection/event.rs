//! Typed events classified from inbound protocol messages.

use irc_proto::{ChannelExt, Command, Message, Mode, Prefix};

/// Every kind of notification a connection can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RawConnected,
    Registered,
    Disconnected,
    ChannelMessage,
    ChannelNotice,
    ChannelMode,
    QueryMessage,
    QueryNotice,
    Join,
    Part,
    Kick,
    UserMode,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::RawConnected,
        EventKind::Registered,
        EventKind::Disconnected,
        EventKind::ChannelMessage,
        EventKind::ChannelNotice,
        EventKind::ChannelMode,
        EventKind::QueryMessage,
        EventKind::QueryNotice,
        EventKind::Join,
        EventKind::Part,
        EventKind::Kick,
        EventKind::UserMode,
    ];

    /// Static name for metrics labels and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::RawConnected => "raw_connected",
            EventKind::Registered => "registered",
            EventKind::Disconnected => "disconnected",
            EventKind::ChannelMessage => "channel_message",
            EventKind::ChannelNotice => "channel_notice",
            EventKind::ChannelMode => "channel_mode",
            EventKind::QueryMessage => "query_message",
            EventKind::QueryNotice => "query_notice",
            EventKind::Join => "join",
            EventKind::Part => "part",
            EventKind::Kick => "kick",
            EventKind::UserMode => "user_mode",
        }
    }
}

/// A PRIVMSG or NOTICE with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Sender nick (or server name).
    pub source: String,
    /// Channel or our own nick.
    pub target: String,
    pub text: String,
}

impl ChatMessage {
    fn new(source: String, target: &str, text: &str) -> Self {
        Self {
            source,
            target: target.to_string(),
            text: text.to_string(),
        }
    }

    pub fn is_channel(&self) -> bool {
        self.target.is_channel_name()
    }

    /// Where a reply should go: the channel, or the sender for a query.
    pub fn reply_target(&self) -> &str {
        if self.is_channel() {
            &self.target
        } else {
            &self.source
        }
    }
}

/// A post-registration event forwarded to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ChannelMessage(ChatMessage),
    QueryMessage(ChatMessage),
    ChannelNotice(ChatMessage),
    QueryNotice(ChatMessage),
    ChannelMode {
        channel: String,
        setter: String,
        modes: String,
    },
    UserMode {
        target: String,
        setter: String,
        modes: String,
    },
    Join {
        channel: String,
        nick: String,
    },
    Part {
        channel: String,
        nick: String,
        reason: Option<String>,
    },
    Kick {
        channel: String,
        nick: String,
        by: String,
        reason: Option<String>,
    },
}

impl Event {
    /// Classify an inbound message. Returns `None` for anything that is not
    /// one of the observed kinds.
    pub fn classify(msg: &Message) -> Option<Event> {
        let source = source_name(msg);
        let event = match &msg.command {
            Command::PRIVMSG(target, text) => {
                let chat = ChatMessage::new(source, target, text);
                if chat.is_channel() {
                    Event::ChannelMessage(chat)
                } else {
                    Event::QueryMessage(chat)
                }
            }
            Command::NOTICE(target, text) => {
                let chat = ChatMessage::new(source, target, text);
                if chat.is_channel() {
                    Event::ChannelNotice(chat)
                } else {
                    Event::QueryNotice(chat)
                }
            }
            Command::ChannelMODE(channel, modes) => Event::ChannelMode {
                channel: channel.clone(),
                setter: source,
                modes: join_modes(modes),
            },
            Command::UserMODE(target, modes) => Event::UserMode {
                target: target.clone(),
                setter: source,
                modes: join_modes(modes),
            },
            Command::JOIN(channel, _, _) => Event::Join {
                channel: channel.clone(),
                nick: source,
            },
            Command::PART(channel, reason) => Event::Part {
                channel: channel.clone(),
                nick: source,
                reason: reason.clone(),
            },
            Command::KICK(channel, nick, reason) => Event::Kick {
                channel: channel.clone(),
                nick: nick.clone(),
                by: source,
                reason: reason.clone(),
            },
            _ => return None,
        };
        Some(event)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::ChannelMessage(_) => EventKind::ChannelMessage,
            Event::QueryMessage(_) => EventKind::QueryMessage,
            Event::ChannelNotice(_) => EventKind::ChannelNotice,
            Event::QueryNotice(_) => EventKind::QueryNotice,
            Event::ChannelMode { .. } => EventKind::ChannelMode,
            Event::UserMode { .. } => EventKind::UserMode,
            Event::Join { .. } => EventKind::Join,
            Event::Part { .. } => EventKind::Part,
            Event::Kick { .. } => EventKind::Kick,
        }
    }
}

/// Nick or server name of the sender; empty when the server omits the prefix.
pub(crate) fn source_name(msg: &Message) -> String {
    match &msg.prefix {
        Some(Prefix::Nickname(nick, _, _)) => nick.clone(),
        Some(Prefix::ServerName(name)) => name.clone(),
        None => String::new(),
    }
}

fn join_modes<T>(modes: &[Mode<T>]) -> String
where
    T: irc_proto::mode::ModeType,
    Mode<T>: ToString,
{
    modes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
