//! The bot aggregate.
//!
//! `Bot` owns everything shared across tasks: configuration, the connection
//! registry, both command routers, the hooks, the run flag and the task
//! tracker for listener tasks. It is always handled through `Arc<Bot>`.

mod coordinator;
mod hooks;

pub use hooks::{BotHooks, LogHooks};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::commands::{
    ChatContext, CommandHandler, ConsoleContext, Router, RouterBuilder, chat, console,
};
use crate::config::{Config, ServerBlock};
use crate::connection::handshake::{HandshakeMachine, Identity};
use crate::connection::{ConnectionHandle, DriverSettings, driver, transport};
use crate::error::{ConnectError, RegistryError};
use crate::registry::ConnectionRegistry;
use coordinator::Coordinator;

pub struct Bot {
    config: Config,
    registry: ConnectionRegistry,
    console_router: Router<ConsoleContext>,
    chat_router: Router<ChatContext>,
    hooks: Arc<dyn BotHooks>,
    running: AtomicBool,
    stop: CancellationToken,
    /// Force-closes every listener once the shutdown grace has run out.
    kill: CancellationToken,
    tasks: TaskTracker,
}

pub struct BotBuilder {
    config: Config,
    hooks: Arc<dyn BotHooks>,
    chat: RouterBuilder<ChatContext>,
}

impl BotBuilder {
    /// Replace the default [`LogHooks`].
    pub fn hooks(mut self, hooks: impl BotHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Add a chat command next to the built-in ones.
    pub fn chat_command(
        mut self,
        name: &str,
        handler: impl CommandHandler<ChatContext> + 'static,
    ) -> Self {
        self.chat = self.chat.register(name, handler);
        self
    }

    pub fn build(self) -> Arc<Bot> {
        Arc::new(Bot {
            config: self.config,
            registry: ConnectionRegistry::new(),
            console_router: console::router(),
            chat_router: self.chat.build(),
            hooks: self.hooks,
            running: AtomicBool::new(false),
            stop: CancellationToken::new(),
            kill: CancellationToken::new(),
            tasks: TaskTracker::new(),
        })
    }
}

impl Bot {
    pub fn builder(config: Config) -> BotBuilder {
        BotBuilder {
            config,
            hooks: Arc::new(LogHooks),
            chat: chat::builtin_commands(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn console_router(&self) -> &Router<ConsoleContext> {
        &self.console_router
    }

    pub fn chat_router(&self) -> &Router<ChatContext> {
        &self.chat_router
    }

    pub fn hooks(&self) -> &Arc<dyn BotHooks> {
        &self.hooks
    }

    // ------------------------------------------------------------------
    // Run flag
    // ------------------------------------------------------------------

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request a stop. The console loop notices and runs [`Bot::shutdown`].
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop.cancel();
    }

    /// Resolves once [`Bot::stop`] has been called.
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.stop.cancelled()
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    /// Connect to `target`: a configured server label, or an ad-hoc
    /// `host[:port]` labelled by that string.
    pub async fn connect_target(
        self: &Arc<Self>,
        target: &str,
    ) -> Result<Arc<ConnectionHandle>, ConnectError> {
        let block = match self.config.server(target) {
            Some(block) => block.clone(),
            None => ServerBlock::from_address(target)
                .ok_or_else(|| ConnectError::InvalidAddress(target.to_string()))?,
        };
        self.connect(&block).await
    }

    /// Open a connection, write the login lines and start its listener.
    ///
    /// Connect and login are bounded by `limits.connect_timeout`; on failure
    /// nothing is added to the registry. Fails with [`ConnectError::Stopped`]
    /// once a stop has been requested.
    pub async fn connect(
        self: &Arc<Self>,
        block: &ServerBlock,
    ) -> Result<Arc<ConnectionHandle>, ConnectError> {
        if self.stop.is_cancelled() {
            return Err(ConnectError::Stopped);
        }
        if self.registry.find_by_exact_label(&block.label).is_some() {
            return Err(RegistryError::DuplicateLabel(block.label.clone()).into());
        }

        let limits = &self.config.limits;
        let mut machine = HandshakeMachine::new(Identity::new(&self.config.bot, block));
        let login = async {
            let mut transport = transport::connect(block).await?;
            for command in machine.begin() {
                transport.send(command.into()).await?;
            }
            Ok::<_, ConnectError>(transport)
        };
        let mut transport = tokio::time::timeout(limits.connect_timeout(), login)
            .await
            .map_err(|_| ConnectError::Timeout {
                address: block.address(),
                secs: limits.connect_timeout,
            })??;

        let (conn, outbound) = ConnectionHandle::new(
            block.label.clone(),
            block.address(),
            machine.nick(),
            block.channels.clone(),
            limits.send_queue,
        );
        conn.mark_connected();
        // A stop may have landed while we were connecting.
        if self.stop.is_cancelled() {
            transport.close().await;
            return Err(ConnectError::Stopped);
        }
        if let Err(e) = self.registry.add(block.label.clone(), conn.clone()) {
            transport.close().await;
            return Err(e.into());
        }

        info!(label = %conn.label, address = %conn.address, conn_id = %conn.id, "Connection established");
        let sink = Arc::new(Coordinator::new(self.clone()));
        self.tasks.spawn(driver::run(
            conn.clone(),
            transport,
            machine,
            outbound,
            sink,
            DriverSettings::from(limits),
            self.kill.clone(),
        ));
        Ok(conn)
    }

    /// Detach the connection labelled exactly `label` and send QUIT.
    ///
    /// The listener closes the socket once the server does, or after the
    /// shutdown grace.
    pub fn disconnect(
        &self,
        label: &str,
        reason: Option<&str>,
    ) -> Result<Arc<ConnectionHandle>, RegistryError> {
        let conn = self
            .registry
            .remove_by_label(label)
            .ok_or_else(|| RegistryError::NotFound(label.to_string()))?;
        let reason = reason.unwrap_or(self.config.bot.quit_message.as_str());
        if let Err(e) = conn.quit(reason) {
            debug!(label = %label, error = %e, "Could not queue QUIT");
        }
        info!(label = %label, "Disconnecting");
        Ok(conn)
    }

    /// Graceful shutdown: QUIT every connection, wait up to the shutdown
    /// grace for listeners to finish, then close whatever is left.
    pub async fn shutdown(&self) {
        self.stop();
        for (label, conn) in self.registry.list_all() {
            if let Err(e) = conn.quit(self.config.bot.quit_message.as_str()) {
                debug!(label = %label, error = %e, "Could not queue QUIT");
            }
        }

        self.tasks.close();
        let grace = self.config.limits.shutdown_grace();
        if tokio::time::timeout(grace, self.tasks.wait()).await.is_err() {
            warn!(remaining = self.tasks.len(), "Connections did not close in time, terminating");
            self.kill.cancel();
            self.tasks.wait().await;
        }
        info!("Shutdown complete");
    }
}
