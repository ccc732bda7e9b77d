//! Per-connection lifecycle state and observer set.
//!
//! The observer set is the explicit record of which event kinds are
//! forwarded for a connection. Transitions attach and detach observers in
//! the same step that changes state, so callers holding the connection's
//! lock never see one without the other.

use super::event::EventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Connecting,
    Connected,
    Registered,
    Disconnected,
}

/// Bit set over [`EventKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserverSet(u16);

const fn bit(kind: EventKind) -> u16 {
    1 << kind as u16
}

impl ObserverSet {
    pub const EMPTY: ObserverSet = ObserverSet(0);

    /// Events observed from the moment a connection is built.
    pub const BOOTSTRAP: ObserverSet = ObserverSet(
        bit(EventKind::RawConnected) | bit(EventKind::Registered) | bit(EventKind::Disconnected),
    );

    /// Events attached once registration completes.
    pub const MESSAGES: ObserverSet = ObserverSet(
        bit(EventKind::ChannelMessage)
            | bit(EventKind::ChannelNotice)
            | bit(EventKind::ChannelMode)
            | bit(EventKind::QueryMessage)
            | bit(EventKind::QueryNotice)
            | bit(EventKind::Join)
            | bit(EventKind::Part)
            | bit(EventKind::Kick)
            | bit(EventKind::UserMode),
    );

    pub fn contains(self, kind: EventKind) -> bool {
        self.0 & bit(kind) != 0
    }

    pub fn union(self, other: ObserverSet) -> ObserverSet {
        ObserverSet(self.0 | other.0)
    }

    pub fn difference(self, other: ObserverSet) -> ObserverSet {
        ObserverSet(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub state: LifecycleState,
    pub observers: ObserverSet,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Connecting,
            observers: ObserverSet::BOOTSTRAP,
        }
    }

    /// Connecting -> Connected. Returns false if already past it.
    pub fn connected(&mut self) -> bool {
        if self.state != LifecycleState::Connecting {
            return false;
        }
        self.state = LifecycleState::Connected;
        true
    }

    /// Connected -> Registered, attaching the message observers.
    pub fn registered(&mut self) -> bool {
        if self.state != LifecycleState::Connected {
            return false;
        }
        self.state = LifecycleState::Registered;
        self.observers = self.observers.union(ObserverSet::MESSAGES);
        true
    }

    /// Any state -> Disconnected, detaching every observer.
    ///
    /// Returns true only for the call that performed the transition.
    pub fn disconnected(&mut self) -> bool {
        if self.state == LifecycleState::Disconnected {
            return false;
        }
        self.state = LifecycleState::Disconnected;
        self.observers = ObserverSet::EMPTY;
        true
    }

    pub fn observes(&self, kind: EventKind) -> bool {
        self.observers.contains(kind)
    }
}
