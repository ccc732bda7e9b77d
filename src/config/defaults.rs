//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Identity Defaults
// =============================================================================

pub fn default_nick() -> String {
    "slircbot".to_string()
}

pub fn default_realname() -> String {
    "Straylight IRC Bot".to_string()
}

pub fn default_command_prefix() -> String {
    ".".to_string()
}

pub fn default_quit_message() -> String {
    "slircbot shutting down".to_string()
}

// =============================================================================
// Limits Defaults
// =============================================================================

pub fn default_connect_timeout() -> u64 {
    30
}

pub fn default_shutdown_grace() -> u64 {
    5
}

pub fn default_messages_per_second() -> u32 {
    2
}

pub fn default_message_burst() -> u32 {
    5
}

pub fn default_send_queue() -> usize {
    256
}

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_port() -> u16 {
    6667
}

pub fn default_log_level() -> String {
    "info".to_string()
}
