//! Integration tests for in-channel chat commands.

mod common;

use std::time::Duration;

use async_trait::async_trait;
use common::{FakeServer, HookEvent, HookLog, Peer, recording_hooks, test_config};
use irc_proto::Command;
use slircbot::Bot;
use slircbot::commands::{ChatContext, CommandHandler};
use slircbot::error::{HandlerResult, expect_args};

struct Echo;

#[async_trait]
impl CommandHandler<ChatContext> for Echo {
    fn usage(&self) -> &'static str {
        "<text>"
    }

    fn summary(&self) -> &'static str {
        "repeat text"
    }

    async fn execute(&self, ctx: &ChatContext, args: &[String]) -> HandlerResult {
        expect_args(args, 1, 1)?;
        ctx.reply(args[0].as_str())?;
        Ok(())
    }
}

struct Boom;

#[async_trait]
impl CommandHandler<ChatContext> for Boom {
    fn summary(&self) -> &'static str {
        "always panics"
    }

    async fn execute(&self, _ctx: &ChatContext, _args: &[String]) -> HandlerResult {
        panic!("boom went the handler");
    }
}

/// Connect a bot with the extra commands and complete registration.
async fn registered_bot() -> (std::sync::Arc<Bot>, Peer, HookLog, FakeServer) {
    let server = FakeServer::bind().await.unwrap();
    let (hooks, mut log) = recording_hooks();
    let bot = Bot::builder(test_config())
        .hooks(hooks)
        .chat_command("echo", Echo)
        .chat_command("boom", Boom)
        .build();
    bot.connect(&server.block("chat")).await.unwrap();
    let mut peer = server.accept().await.unwrap();
    peer.register("slircbot").await.unwrap();
    assert_eq!(log.next().await.unwrap(), HookEvent::Registered("chat".into()));
    (bot, peer, log, server)
}

async fn expect_notice(peer: &mut Peer, target: &str, text: &str) {
    let notice = peer.recv_command("NOTICE").await.unwrap();
    assert_eq!(notice, Command::NOTICE(target.to_string(), text.to_string()));
}

#[tokio::test]
async fn test_ping_replies_and_skips_message_hook() {
    let (_bot, mut peer, mut log, _server) = registered_bot().await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.ping").await.unwrap();
    expect_notice(&mut peer, "#bots", "pong").await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :hello").await.unwrap();
    match log.next().await.unwrap() {
        HookEvent::Message(_, message) => assert_eq!(message.text, "hello"),
        other => panic!("expected plain message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_nick_addressed_query_replies_to_sender() {
    let (_bot, mut peer, _log, _server) = registered_bot().await;

    peer.send_raw(":alice!a@h PRIVMSG slircbot :SlircBot, ping")
        .await
        .unwrap();
    expect_notice(&mut peer, "alice", "pong").await;
}

#[tokio::test]
async fn test_unrecognized_command_is_reported() {
    let (_bot, mut peer, mut log, _server) = registered_bot().await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.dance now")
        .await
        .unwrap();
    expect_notice(&mut peer, "#bots", "dance: command not recognized").await;
    match log.next().await.unwrap() {
        HookEvent::Message(_, message) => assert_eq!(message.text, ".dance now"),
        other => panic!("expected message hook, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_arguments_then_recovery() {
    let (_bot, mut peer, _log, _server) = registered_bot().await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.echo").await.unwrap();
    expect_notice(
        &mut peer,
        "#bots",
        "echo: invalid arguments (usage: echo <text>)",
    )
    .await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.echo /hello there friend")
        .await
        .unwrap();
    expect_notice(&mut peer, "#bots", "hello there friend").await;
}

#[tokio::test]
async fn test_panicking_handler_is_contained() {
    let (bot, mut peer, _log, _server) = registered_bot().await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.boom").await.unwrap();
    expect_notice(
        &mut peer,
        "#bots",
        "boom: handler panicked: boom went the handler",
    )
    .await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.ping").await.unwrap();
    expect_notice(&mut peer, "#bots", "pong").await;
    assert_eq!(bot.registry().len(), 1);
}

#[tokio::test]
async fn test_help_lists_commands() {
    let (_bot, mut peer, _log, _server) = registered_bot().await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.help").await.unwrap();
    expect_notice(
        &mut peer,
        "#bots",
        "commands: .boom .echo .help .ping .uptime",
    )
    .await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.help echo").await.unwrap();
    expect_notice(&mut peer, "#bots", ".echo <text>: repeat text").await;
}

#[tokio::test]
async fn test_uptime_mentions_label() {
    let (_bot, mut peer, _log, _server) = registered_bot().await;

    peer.send_raw(":alice!a@h PRIVMSG #bots :.uptime").await.unwrap();
    let Command::NOTICE(target, text) = peer.recv_command("NOTICE").await.unwrap() else {
        panic!("expected NOTICE");
    };
    assert_eq!(target, "#bots");
    assert!(text.starts_with("connected to chat for "), "got {text}");
}

#[tokio::test]
async fn test_notices_are_never_commands() {
    let (_bot, mut peer, mut log, _server) = registered_bot().await;

    peer.send_raw(":alice!a@h NOTICE #bots :.ping").await.unwrap();
    let before = peer.sync().await.unwrap();
    assert!(before.is_empty(), "bot answered a notice: {before:?}");
    assert!(
        peer.recv_timeout(Duration::from_millis(300)).await.is_err(),
        "bot answered a notice"
    );
    match log.next().await.unwrap() {
        HookEvent::Notice(_, notice) => assert_eq!(notice.text, ".ping"),
        other => panic!("expected notice hook, got {other:?}"),
    }
}
