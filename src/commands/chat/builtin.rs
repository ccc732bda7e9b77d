//! Built-in chat commands.

use async_trait::async_trait;

use super::ChatContext;
use crate::commands::router::CommandHandler;
use crate::error::{HandlerResult, expect_args};

/// `help [command]`: list chat commands, or show one command's usage.
pub struct HelpCommand;

#[async_trait]
impl CommandHandler<ChatContext> for HelpCommand {
    fn usage(&self) -> &'static str {
        "[command]"
    }

    fn summary(&self) -> &'static str {
        "list chat commands"
    }

    async fn execute(&self, ctx: &ChatContext, args: &[String]) -> HandlerResult {
        expect_args(args, 0, 1)?;
        let router = ctx.bot.chat_router();
        let prefix = ctx.bot.config().bot.prefix_char();

        if let Some(wanted) = args.first() {
            let wanted = wanted.to_ascii_lowercase();
            let found = router.commands().find(|(name, _)| *name == wanted);
            let text = match found {
                Some((name, handler)) => match handler.usage() {
                    "" => format!("{prefix}{name}: {}", handler.summary()),
                    usage => format!("{prefix}{name} {usage}: {}", handler.summary()),
                },
                None => format!("{wanted}: command not recognized"),
            };
            ctx.reply(text)?;
            return Ok(());
        }

        let names: Vec<String> = router
            .commands()
            .map(|(name, _)| format!("{prefix}{name}"))
            .collect();
        ctx.reply(format!("commands: {}", names.join(" ")))?;
        Ok(())
    }
}

pub struct PingCommand;

#[async_trait]
impl CommandHandler<ChatContext> for PingCommand {
    fn summary(&self) -> &'static str {
        "check that the bot is alive"
    }

    async fn execute(&self, ctx: &ChatContext, args: &[String]) -> HandlerResult {
        expect_args(args, 0, 0)?;
        ctx.reply("pong")?;
        Ok(())
    }
}

/// `uptime`: time since this connection was established.
pub struct UptimeCommand;

#[async_trait]
impl CommandHandler<ChatContext> for UptimeCommand {
    fn summary(&self) -> &'static str {
        "time connected to this server"
    }

    async fn execute(&self, ctx: &ChatContext, args: &[String]) -> HandlerResult {
        expect_args(args, 0, 0)?;
        ctx.reply(format!(
            "connected to {} for {}",
            ctx.conn.label,
            format_duration(ctx.conn.uptime())
        ))?;
        Ok(())
    }
}

/// Compact `1d 2h 3m 4s` rendering; leading zero units are omitted.
pub fn format_duration(duration: chrono::Duration) -> String {
    let total = duration.num_seconds().max(0);
    let (days, hours, minutes, seconds) = (
        total / 86_400,
        total % 86_400 / 3_600,
        total % 3_600 / 60,
        total % 60,
    );
    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
