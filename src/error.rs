//! Unified error handling for slircbot.
//!
//! This module provides the error hierarchy shared by the registry, the
//! connection layer and the command routers, with static codes for metric
//! labeling.

use thiserror::Error;

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors raised by the connection registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("a connection labelled '{0}' already exists")]
    DuplicateLabel(String),

    #[error("connection is already registered as '{0}'")]
    DuplicateConnection(String),

    #[error("mask '{mask}' matches more than one connection: {}", .labels.join(", "))]
    AmbiguousMatch { mask: String, labels: Vec<String> },

    #[error("no connection matches '{0}'")]
    NotFound(String),

    #[error("invalid mask '{mask}': {reason}")]
    InvalidMask { mask: String, reason: String },
}

impl RegistryError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateLabel(_) => "duplicate_label",
            Self::DuplicateConnection(_) => "duplicate_connection",
            Self::AmbiguousMatch { .. } => "ambiguous_match",
            Self::NotFound(_) => "not_found",
            Self::InvalidMask { .. } => "invalid_mask",
        }
    }
}

// ============================================================================
// Connection Errors
// ============================================================================

/// Errors raised while establishing a connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("timed out connecting to {address} after {secs}s")]
    Timeout { address: String, secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("bot is stopped")]
    Stopped,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ConnectError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "connection_timeout",
            Self::Io(_) => "io",
            Self::Tls(_) => "tls",
            Self::InvalidAddress(_) => "invalid_address",
            Self::Stopped => "stopped",
            Self::Registry(e) => e.error_code(),
        }
    }
}

/// Errors raised when queueing an outbound line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("send queue is full")]
    QueueFull,

    #[error("connection is closed")]
    Closed,

    #[error("invalid parameter '{0}'")]
    InvalidParameter(String),
}

/// Errors that end the registration handshake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    #[error("all configured nicknames are in use")]
    NicknamesExhausted,

    #[error("SASL authentication failed: {0}")]
    SaslFailed(String),

    #[error("server closed the link: {0}")]
    ServerError(String),
}

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur during command handling.
///
/// The router turns every variant into a notification on the channel the
/// command came from; none of them are fatal.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Wrong argument count or shape. The router attaches the command name.
    #[error("invalid arguments")]
    InvalidArguments,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Send(#[from] SendError),

    #[error("{0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArguments => "invalid_arguments",
            Self::Registry(e) => e.error_code(),
            Self::Connect(e) => e.error_code(),
            Self::Send(_) => "send_error",
            Self::Failed(_) => "handler_failure",
            Self::Panicked(_) => "handler_panic",
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Reject an argument list whose length is outside `min..=max`.
pub fn expect_args(args: &[String], min: usize, max: usize) -> HandlerResult {
    if args.len() < min || args.len() > max {
        Err(HandlerError::InvalidArguments)
    } else {
        Ok(())
    }
}
