//! slircbot - Straylight IRC Bot.
//!
//! A multi-connection IRC bot controller: one listener task per server,
//! a shared connection registry, and two command routers (operator console
//! and in-channel chat commands).

pub mod bot;
pub mod casemap;
pub mod commands;
pub mod config;
pub mod connection;
pub mod console;
pub mod error;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod telemetry;

pub use bot::{Bot, BotBuilder, BotHooks, LogHooks};
pub use config::Config;
pub use registry::ConnectionRegistry;
