//! Per-connection actions: join, leave, say.
//!
//! Each takes a server mask, resolved with
//! [`ConnectionRegistry::find_by_pattern`](crate::registry::ConnectionRegistry::find_by_pattern).

use async_trait::async_trait;

use super::ConsoleContext;
use crate::commands::router::CommandHandler;
use crate::error::{HandlerResult, expect_args};

pub struct JoinCommand;

#[async_trait]
impl CommandHandler<ConsoleContext> for JoinCommand {
    fn usage(&self) -> &'static str {
        "<server-mask> <room>"
    }

    fn summary(&self) -> &'static str {
        "join a room"
    }

    async fn execute(&self, ctx: &ConsoleContext, args: &[String]) -> HandlerResult {
        expect_args(args, 2, 2)?;
        let conn = ctx.bot.registry().find_by_pattern(&args[0])?;
        conn.join(args[1].as_str())?;
        ctx.out.print(&format!("{}: joining {}", conn.label, args[1]));
        Ok(())
    }
}

pub struct LeaveCommand;

#[async_trait]
impl CommandHandler<ConsoleContext> for LeaveCommand {
    fn usage(&self) -> &'static str {
        "<server-mask> <room>"
    }

    fn summary(&self) -> &'static str {
        "leave a room"
    }

    async fn execute(&self, ctx: &ConsoleContext, args: &[String]) -> HandlerResult {
        expect_args(args, 2, 2)?;
        let conn = ctx.bot.registry().find_by_pattern(&args[0])?;
        conn.part(args[1].as_str(), None)?;
        ctx.out.print(&format!("{}: leaving {}", conn.label, args[1]));
        Ok(())
    }
}

/// `say <server-mask> <target> <text...>`
pub struct SayCommand;

#[async_trait]
impl CommandHandler<ConsoleContext> for SayCommand {
    fn usage(&self) -> &'static str {
        "<server-mask> <target> <text...>"
    }

    fn summary(&self) -> &'static str {
        "send a message to a room or user"
    }

    async fn execute(&self, ctx: &ConsoleContext, args: &[String]) -> HandlerResult {
        expect_args(args, 3, usize::MAX)?;
        let conn = ctx.bot.registry().find_by_pattern(&args[0])?;
        conn.privmsg(args[1].as_str(), args[2..].join(" "))?;
        Ok(())
    }
}
