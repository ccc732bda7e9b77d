//! Per-connection listener task.
//!
//! One task per connection reads inbound lines, finishes the registration
//! handshake, classifies events and drains the outbound queue through a
//! rate limiter. It is the only source of events for its connection and it
//! owns teardown: when it returns, the connection is disconnected.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use irc_proto::{Command, Message};
use nonzero_ext::nonzero;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

use super::event::{Event, source_name};
use super::handle::ConnectionHandle;
use super::handshake::{HandshakeMachine, Step};
use super::lifecycle::LifecycleState;
use super::transport::Transport;
use crate::config::LimitsConfig;

/// Receiver of a connection's lifecycle notifications and observed events.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// RPL_WELCOME received; message observers are now attached.
    async fn registered(&self, conn: &Arc<ConnectionHandle>);

    /// An event the connection currently observes.
    async fn event(&self, conn: &Arc<ConnectionHandle>, event: Event);

    /// Called exactly once, after observers have been detached.
    async fn disconnected(&self, conn: &Arc<ConnectionHandle>, reason: &str);
}

/// Pacing and shutdown knobs for one listener.
#[derive(Debug, Clone, Copy)]
pub struct DriverSettings {
    pub messages_per_second: u32,
    pub message_burst: u32,
    /// How long to wait for the server to close after our QUIT.
    pub quit_grace: Duration,
}

impl From<&LimitsConfig> for DriverSettings {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            messages_per_second: limits.messages_per_second,
            message_burst: limits.message_burst,
            quit_grace: limits.shutdown_grace(),
        }
    }
}

impl DriverSettings {
    fn limiter(&self) -> DefaultDirectRateLimiter {
        let rate = NonZeroU32::new(self.messages_per_second).unwrap_or(nonzero!(1u32));
        let burst = NonZeroU32::new(self.message_burst).unwrap_or(nonzero!(1u32));
        RateLimiter::direct(Quota::per_second(rate).allow_burst(burst))
    }
}

/// Run the listener until the connection ends.
///
/// `kill` closes the socket immediately; it is the fallback when a graceful
/// QUIT does not finish in time.
pub async fn run<S: EventSink>(
    conn: Arc<ConnectionHandle>,
    transport: Transport,
    machine: HandshakeMachine,
    outbound: mpsc::Receiver<Command>,
    sink: Arc<S>,
    settings: DriverSettings,
    kill: CancellationToken,
) {
    let span = crate::telemetry::spans::connection(&conn.label, &conn.id.to_string());
    async move {
        let mut listener = Listener {
            conn: conn.clone(),
            transport,
            machine,
            sink: sink.clone(),
        };
        let reason = listener.run(outbound, settings, kill).await;
        listener.transport.close().await;

        if conn.mark_disconnected() {
            info!(reason = %reason, "Disconnected");
            sink.disconnected(&conn, &reason).await;
        }
    }
    .instrument(span)
    .await
}

struct Listener<S> {
    conn: Arc<ConnectionHandle>,
    transport: Transport,
    machine: HandshakeMachine,
    sink: Arc<S>,
}

impl<S: EventSink> Listener<S> {
    /// Returns the reason the connection ended.
    async fn run(
        &mut self,
        mut outbound: mpsc::Receiver<Command>,
        settings: DriverSettings,
        kill: CancellationToken,
    ) -> String {
        let limiter = settings.limiter();
        let mut quit_deadline: Option<Instant> = None;

        loop {
            let deadline = quit_deadline;
            let quit_timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = kill.cancelled() => return "terminated".to_string(),
                _ = quit_timer => return "server did not close after QUIT".to_string(),
                line = self.transport.next_line() => match line {
                    None => return "connection closed by server".to_string(),
                    Some(Err(e)) => return format!("read error: {e}"),
                    Some(Ok(line)) => {
                        if let Err(reason) = self.handle_line(&line).await {
                            return reason;
                        }
                    }
                },
                Some(command) = outbound.recv() => {
                    if !matches!(command, Command::PONG(..)) {
                        limiter.until_ready().await;
                    }
                    if matches!(command, Command::QUIT(_)) && quit_deadline.is_none() {
                        quit_deadline = Some(Instant::now() + settings.quit_grace);
                    }
                    if let Err(reason) = self.write(command).await {
                        return reason;
                    }
                }
            }
        }
    }

    /// Process one inbound line. An `Err` carries the disconnect reason.
    async fn handle_line(&mut self, line: &str) -> Result<(), String> {
        if line.is_empty() {
            return Ok(());
        }
        let msg = match line.parse::<Message>() {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, line = %line, "Ignoring unparsable line");
                return Ok(());
            }
        };
        debug!(line = %line, "<-");

        if let Command::PING(token, _) = &msg.command {
            return self.write(Command::PONG(token.clone(), None)).await;
        }

        match self.conn.state() {
            LifecycleState::Connecting | LifecycleState::Connected => self.handshake(&msg).await,
            LifecycleState::Registered => {
                self.registered_message(&msg).await;
                Ok(())
            }
            LifecycleState::Disconnected => Ok(()),
        }
    }

    async fn handshake(&mut self, msg: &Message) -> Result<(), String> {
        match self.machine.step(msg) {
            Ok(Step::Continue(commands)) => {
                for command in commands {
                    self.write(command).await?;
                }
                Ok(())
            }
            Ok(Step::Registered { nick }) => {
                self.conn.set_nick(nick.as_str());
                if self.conn.mark_registered() {
                    info!(nick = %nick, "Registered");
                    self.sink.registered(&self.conn).await;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                Err(format!("registration failed: {e}"))
            }
        }
    }

    async fn registered_message(&mut self, msg: &Message) {
        match &msg.command {
            Command::ERROR(reason) => {
                info!(reason = %reason, "Server sent ERROR");
                return;
            }
            Command::NICK(new) => {
                let old = source_name(msg);
                if self.conn.is_own_nick(&old) {
                    info!(old = %old, new = %new, "Nick changed");
                    self.conn.set_nick(new.as_str());
                }
                return;
            }
            _ => {}
        }

        let Some(event) = Event::classify(msg) else {
            return;
        };
        self.conn.track_membership(&event);
        let kind = event.kind();
        if self.conn.observes(kind) {
            crate::metrics::record_message(kind.as_str());
            self.sink.event(&self.conn, event).await;
        }
    }

    async fn write(&mut self, command: Command) -> Result<(), String> {
        self.transport
            .send(Message::from(command))
            .await
            .map_err(|e| format!("write error: {e}"))
    }
}
