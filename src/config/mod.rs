//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, BotConfig, LoggingConfig)
//! - [`servers`]: Per-network server blocks (ServerBlock, SaslConfig)
//! - [`limits`]: Timeouts and outbound flood control (LimitsConfig)
//! - [`validation`]: Startup validation

mod defaults;
mod limits;
mod servers;
mod types;
mod validation;

pub use limits::LimitsConfig;
pub use servers::{SaslConfig, ServerBlock};
pub use types::{BotConfig, Config, ConfigError, LogFormat, LoggingConfig};
pub use validation::{ValidationError, validate};
