//! Named-handler router shared by the console and chat scopes.
//!
//! A `Router<C>` is built once from a [`RouterBuilder`] and never changes
//! afterwards, so dispatch needs no locking. Every failure inside a handler,
//! panics included, stops at the router and becomes a single notification
//! through the context.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::FutureExt;
use tracing::{Instrument, debug, warn};

use super::tokenizer::ParsedCommand;
use crate::error::{HandlerError, HandlerResult};
use crate::telemetry::{CommandTimer, spans};

/// Where a router reports problems: the console error stream, or a NOTICE
/// back to the originating channel or user.
#[async_trait]
pub trait CommandContext: Send + Sync {
    async fn notify(&self, text: &str);
}

/// A command handler in scope `C`.
#[async_trait]
pub trait CommandHandler<C: Sync>: Send + Sync {
    /// Argument synopsis, e.g. `<server-mask> <room>`.
    fn usage(&self) -> &'static str {
        ""
    }

    /// One-line description for `help`.
    fn summary(&self) -> &'static str;

    async fn execute(&self, ctx: &C, args: &[String]) -> HandlerResult;
}

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Failed,
    Unrecognized,
}

pub struct RouterBuilder<C: Sync> {
    scope: &'static str,
    handlers: BTreeMap<String, Box<dyn CommandHandler<C>>>,
}

impl<C: Sync> RouterBuilder<C> {
    pub fn new(scope: &'static str) -> Self {
        Self {
            scope,
            handlers: BTreeMap::new(),
        }
    }

    /// Register `handler` under `name`. A later registration of the same
    /// name replaces the earlier one.
    pub fn register(mut self, name: &str, handler: impl CommandHandler<C> + 'static) -> Self {
        self.handlers
            .insert(name.to_ascii_lowercase(), Box::new(handler));
        self
    }

    pub fn build(self) -> Router<C> {
        Router {
            scope: self.scope,
            handlers: self.handlers,
        }
    }
}

/// Immutable command table.
pub struct Router<C: Sync> {
    scope: &'static str,
    handlers: BTreeMap<String, Box<dyn CommandHandler<C>>>,
}

impl<C: CommandContext> Router<C> {
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered commands in name order.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &dyn CommandHandler<C>)> {
        self.handlers
            .iter()
            .map(|(name, handler)| (name.as_str(), handler.as_ref()))
    }

    /// Look up and run the handler for `cmd`.
    pub async fn dispatch(&self, ctx: &C, cmd: &ParsedCommand) -> Outcome {
        let name = cmd.name.to_ascii_lowercase();
        let Some(handler) = self.handlers.get(&name) else {
            debug!(scope = self.scope, command = %name, "Unrecognized command");
            crate::metrics::record_command_error(self.scope, "unrecognized");
            ctx.notify(&format!("{name}: command not recognized")).await;
            return Outcome::Unrecognized;
        };

        let result = {
            let _timer = CommandTimer::new(self.scope, name.as_str());
            AssertUnwindSafe(handler.execute(ctx, &cmd.args))
                .catch_unwind()
                .instrument(spans::command(self.scope, &name))
                .await
        };

        let err = match result {
            Ok(Ok(())) => return Outcome::Handled,
            Ok(Err(e)) => e,
            Err(panic) => HandlerError::Panicked(panic_message(panic.as_ref())),
        };

        crate::metrics::record_command_error(self.scope, err.error_code());
        warn!(scope = self.scope, command = %name, error = %err, "Command failed");

        let text = match &err {
            HandlerError::InvalidArguments => match handler.usage() {
                "" => format!("{name}: invalid arguments (usage: {name})"),
                usage => format!("{name}: invalid arguments (usage: {name} {usage})"),
            },
            other => format!("{name}: {other}"),
        };
        ctx.notify(&text).await;
        Outcome::Failed
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
