//! Console-scope commands.
//!
//! These act on the whole bot rather than one connection. Output goes to the
//! console's standard stream, and errors to its error stream.

mod channel;
mod network;
mod session;

use std::sync::Arc;

use async_trait::async_trait;

use super::router::{CommandContext, Router, RouterBuilder};
use crate::bot::Bot;
use crate::console::ConsoleOutput;

pub use channel::{JoinCommand, LeaveCommand, SayCommand};
pub use network::{ConnectCommand, DisconnectCommand, ListCommand};
pub use session::{ExitCommand, HelpCommand};

/// Context handed to console command handlers.
pub struct ConsoleContext {
    pub bot: Arc<Bot>,
    pub out: Arc<dyn ConsoleOutput>,
}

impl ConsoleContext {
    pub fn new(bot: Arc<Bot>, out: Arc<dyn ConsoleOutput>) -> Self {
        Self { bot, out }
    }
}

#[async_trait]
impl CommandContext for ConsoleContext {
    async fn notify(&self, text: &str) {
        self.out.error(text);
    }
}

/// The console command table.
pub fn router() -> Router<ConsoleContext> {
    RouterBuilder::new("console")
        .register("exit", ExitCommand)
        .register("help", HelpCommand)
        .register("connect", ConnectCommand)
        .register("disconnect", DisconnectCommand)
        .register("list", ListCommand)
        .register("join", JoinCommand)
        .register("leave", LeaveCommand)
        .register("say", SayCommand)
        .build()
}
