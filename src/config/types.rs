//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_command_prefix, default_log_level, default_nick, default_quit_message,
    default_realname,
};
use super::limits::LimitsConfig;
use super::servers::ServerBlock;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Prometheus metrics HTTP port (absent or 0 disables the endpoint).
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// Bot identity and command syntax.
    #[serde(default)]
    pub bot: BotConfig,
    /// Timeouts and flood control.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Networks the bot knows how to reach.
    #[serde(default)]
    pub servers: Vec<ServerBlock>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Look up a configured server block by its label (ASCII case-insensitive).
    pub fn server(&self, label: &str) -> Option<&ServerBlock> {
        self.servers
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(label))
    }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Preferred nickname.
    #[serde(default = "default_nick")]
    pub nick: String,
    /// Nicknames tried in order when the preferred one is taken.
    #[serde(default)]
    pub alt_nicks: Vec<String>,
    /// Username sent with USER (defaults to the nick).
    #[serde(default)]
    pub username: Option<String>,
    /// Realname sent with USER.
    #[serde(default = "default_realname")]
    pub realname: String,
    /// Single character that introduces a chat command (default: ".").
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Message sent with QUIT on shutdown.
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
}

impl BotConfig {
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nick)
    }

    /// The configured prefix character, falling back to `.`.
    pub fn prefix_char(&self) -> char {
        self.command_prefix.chars().next().unwrap_or('.')
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nick: default_nick(),
            alt_nicks: Vec::new(),
            username: None,
            realname: default_realname(),
            command_prefix: default_command_prefix(),
            quit_message: default_quit_message(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
