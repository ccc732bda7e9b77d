//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::collections::HashSet;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bot.nick is required")]
    MissingNick,
    #[error("bot.nick must not contain spaces, got '{0}'")]
    InvalidNick(String),
    #[error("bot.command_prefix must be exactly one character, got '{0}'")]
    InvalidPrefix(String),
    #[error("servers[{0}].label is required")]
    MissingLabel(usize),
    #[error("duplicate server label '{0}'")]
    DuplicateLabel(String),
    #[error("server '{0}' has no host")]
    MissingHost(String),
    #[error("server '{0}' has port 0")]
    InvalidPort(String),
    #[error("limits.{0} must be at least 1")]
    ZeroLimit(&'static str),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let nick = &config.bot.nick;
    if nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if nick.contains(' ') {
        errors.push(ValidationError::InvalidNick(nick.clone()));
    }

    if config.bot.command_prefix.chars().count() != 1 {
        errors.push(ValidationError::InvalidPrefix(
            config.bot.command_prefix.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for (i, server) in config.servers.iter().enumerate() {
        if server.label.is_empty() {
            errors.push(ValidationError::MissingLabel(i));
        } else if !seen.insert(server.label.to_ascii_lowercase()) {
            errors.push(ValidationError::DuplicateLabel(server.label.clone()));
        }
        if server.host.is_empty() {
            errors.push(ValidationError::MissingHost(server.label.clone()));
        }
        if server.port == 0 {
            errors.push(ValidationError::InvalidPort(server.label.clone()));
        }
    }

    if config.limits.messages_per_second == 0 {
        errors.push(ValidationError::ZeroLimit("messages_per_second"));
    }
    if config.limits.message_burst == 0 {
        errors.push(ValidationError::ZeroLimit("message_burst"));
    }
    if config.limits.send_queue == 0 {
        errors.push(ValidationError::ZeroLimit("send_queue"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
