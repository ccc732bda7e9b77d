//! Connection timeouts and outbound flood control configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_connect_timeout, default_message_burst, default_messages_per_second,
    default_send_queue, default_shutdown_grace,
};

/// Timing and pacing limits shared by every connection.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Seconds allowed for TCP/TLS connect plus the login lines (default: 30).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Seconds to wait for servers to close after QUIT (default: 5).
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: u64,
    /// Sustained outbound lines per second per connection (default: 2).
    #[serde(default = "default_messages_per_second")]
    pub messages_per_second: u32,
    /// Outbound burst allowance per connection (default: 5).
    #[serde(default = "default_message_burst")]
    pub message_burst: u32,
    /// Capacity of each connection's outbound queue (default: 256).
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
}

impl LimitsConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            shutdown_grace: default_shutdown_grace(),
            messages_per_second: default_messages_per_second(),
            message_burst: default_message_burst(),
            send_queue: default_send_queue(),
        }
    }
}
