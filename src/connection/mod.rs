//! Per-connection machinery.
//!
//! A connection is opened by [`transport::connect`], logged in by a
//! [`handshake::HandshakeMachine`], and then owned by a listener task
//! ([`driver::run`]) until it disconnects. Everything the rest of the bot
//! needs to know about it lives on the shared [`ConnectionHandle`].

pub mod driver;
pub mod event;
pub mod handle;
pub mod handshake;
pub mod lifecycle;
pub mod transport;

pub use driver::{DriverSettings, EventSink};
pub use event::{ChatMessage, Event, EventKind};
pub use handle::{ConnectionHandle, ConnectionId};
pub use handshake::{HandshakeMachine, HandshakeState, Identity, Step};
pub use lifecycle::{Lifecycle, LifecycleState, ObserverSet};
pub use transport::{IrcStream, Transport};
