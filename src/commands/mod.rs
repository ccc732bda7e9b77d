//! Command parsing and routing.
//!
//! Two routers share one implementation: the console router, whose handlers
//! act on the whole bot, and the chat router, whose handlers are bound to
//! the connection and message a command arrived on.

pub mod chat;
pub mod console;
pub mod router;
pub mod tokenizer;

pub use chat::ChatContext;
pub use console::ConsoleContext;
pub use router::{CommandContext, CommandHandler, Outcome, Router, RouterBuilder};
pub use tokenizer::ParsedCommand;
