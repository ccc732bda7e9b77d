//! Session commands: exit, help.

use async_trait::async_trait;

use super::ConsoleContext;
use crate::commands::router::CommandHandler;
use crate::error::{HandlerResult, expect_args};

/// `exit`: stop the bot.
pub struct ExitCommand;

#[async_trait]
impl CommandHandler<ConsoleContext> for ExitCommand {
    fn summary(&self) -> &'static str {
        "disconnect everything and stop"
    }

    async fn execute(&self, ctx: &ConsoleContext, args: &[String]) -> HandlerResult {
        expect_args(args, 0, 0)?;
        ctx.out.print("stopping");
        ctx.bot.stop();
        Ok(())
    }
}

/// `help`: list console commands.
pub struct HelpCommand;

#[async_trait]
impl CommandHandler<ConsoleContext> for HelpCommand {
    fn summary(&self) -> &'static str {
        "show this list"
    }

    async fn execute(&self, ctx: &ConsoleContext, args: &[String]) -> HandlerResult {
        expect_args(args, 0, 0)?;
        for (name, handler) in ctx.bot.console_router().commands() {
            let synopsis = match handler.usage() {
                "" => name.to_string(),
                usage => format!("{name} {usage}"),
            };
            ctx.out.print(&format!("{synopsis:<40} {}", handler.summary()));
        }
        Ok(())
    }
}
