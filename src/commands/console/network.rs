//! Connection management commands: connect, disconnect, list.

use async_trait::async_trait;

use super::ConsoleContext;
use crate::commands::router::CommandHandler;
use crate::error::{HandlerResult, expect_args};

/// `connect <label|host[:port]>`
pub struct ConnectCommand;

#[async_trait]
impl CommandHandler<ConsoleContext> for ConnectCommand {
    fn usage(&self) -> &'static str {
        "<label|host[:port]>"
    }

    fn summary(&self) -> &'static str {
        "connect to a configured server or an address"
    }

    async fn execute(&self, ctx: &ConsoleContext, args: &[String]) -> HandlerResult {
        expect_args(args, 1, 1)?;
        let conn = ctx.bot.connect_target(&args[0]).await?;
        ctx.out
            .print(&format!("{}: connected to {}", conn.label, conn.address));
        Ok(())
    }
}

/// `disconnect <server-label> [reason...]`
pub struct DisconnectCommand;

#[async_trait]
impl CommandHandler<ConsoleContext> for DisconnectCommand {
    fn usage(&self) -> &'static str {
        "<server-label> [reason...]"
    }

    fn summary(&self) -> &'static str {
        "quit one server"
    }

    async fn execute(&self, ctx: &ConsoleContext, args: &[String]) -> HandlerResult {
        expect_args(args, 1, usize::MAX)?;
        let reason = args[1..].join(" ");
        let reason = (!reason.is_empty()).then_some(reason.as_str());
        let conn = ctx.bot.disconnect(&args[0], reason)?;
        ctx.out.print(&format!("{}: disconnecting", conn.label));
        Ok(())
    }
}

/// `list`: one line per connection with address, nick and rooms.
pub struct ListCommand;

#[async_trait]
impl CommandHandler<ConsoleContext> for ListCommand {
    fn summary(&self) -> &'static str {
        "show connections"
    }

    async fn execute(&self, ctx: &ConsoleContext, args: &[String]) -> HandlerResult {
        expect_args(args, 0, 0)?;
        let registry = ctx.bot.registry();
        if registry.is_empty() {
            ctx.out.print("no connections");
            return Ok(());
        }
        for (label, conn) in registry.list_all() {
            let channels = conn.channels();
            let rooms = if channels.is_empty() {
                "-".to_string()
            } else {
                channels.join(", ")
            };
            ctx.out.print(&format!(
                "{label}: {} as {} ({:?}) in {rooms}",
                conn.address,
                conn.nick(),
                conn.state()
            ));
        }
        Ok(())
    }
}
