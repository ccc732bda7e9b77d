//! Integration test common infrastructure.
//!
//! Provides a scripted fake IRC server, recording hooks, and a bot
//! configuration tuned for fast tests.

pub mod hooks;
pub mod server;

#[allow(unused_imports)]
pub use hooks::{HookEvent, HookLog, RecordingHooks, recording_hooks};
#[allow(unused_imports)]
pub use server::{FakeServer, Peer};

use std::sync::Arc;

use slircbot::{Bot, Config};

/// Config with short timeouts and no effective rate limit.
#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.bot.nick = "slircbot".to_string();
    config.bot.alt_nicks = vec!["slircbot_".to_string()];
    config.bot.quit_message = "test over".to_string();
    config.limits.connect_timeout = 2;
    config.limits.shutdown_grace = 1;
    config.limits.messages_per_second = 1000;
    config.limits.message_burst = 1000;
    config
}

/// A bot with recording hooks.
#[allow(dead_code)]
pub fn recording_bot(config: Config) -> (Arc<Bot>, HookLog) {
    let (hooks, log) = recording_hooks();
    (Bot::builder(config).hooks(hooks).build(), log)
}
