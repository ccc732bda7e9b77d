//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    scope: &'static str,
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(scope: &'static str, command: impl Into<String>) -> Self {
        Self {
            scope,
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(self.scope, &self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Span covering one connection's listener task.
    pub fn connection(label: &str, conn_id: &str) -> Span {
        info_span!("connection", label = %label, conn_id = %conn_id)
    }

    /// Span covering one command dispatch.
    pub fn command(scope: &str, name: &str) -> Span {
        debug_span!("command", scope = %scope, command = %name)
    }
}
