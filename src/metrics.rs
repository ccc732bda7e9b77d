//! Prometheus metrics collection for slircbot.
//!
//! - `slircbot_commands_total{scope,command}` - Commands dispatched by scope
//! - `slircbot_command_errors_total{scope,kind}` - Failed or unrecognized commands
//! - `slircbot_command_duration_seconds{scope}` - Handler latency histogram
//! - `slircbot_connections` - Connections currently in the registry
//! - `slircbot_messages_received_total{kind}` - Inbound events by kind
//!
//! Recording before [`init`] is a no-op.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Commands dispatched, by router scope and command name.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command failures by router scope and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Handler latency by router scope.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Connections currently held by the registry.
pub static CONNECTIONS: OnceLock<IntGauge> = OnceLock::new();

/// Inbound events delivered to the coordinator, by kind.
pub static MESSAGES_RECEIVED: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(
        Opts::new("slircbot_commands_total", "Commands dispatched by scope"),
        &["scope", "command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(
        Opts::new("slircbot_command_errors_total", "Command failures by scope and kind"),
        &["scope", "kind"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("slircbot_command_duration_seconds", "Command handler latency")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["scope"]));
    register!(CONNECTIONS, IntGauge::new("slircbot_connections", "Connections in the registry"));
    register!(MESSAGES_RECEIVED, IntCounterVec::new(
        Opts::new("slircbot_messages_received_total", "Inbound events by kind"),
        &["kind"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

/// Record a dispatched command with latency.
#[inline]
pub fn record_command(scope: &str, command: &str, duration_secs: f64) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[scope, command]).inc();
    }
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[scope]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(scope: &str, kind: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[scope, kind]).inc();
    }
}

#[inline]
pub fn connection_added() {
    if let Some(g) = CONNECTIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn connection_removed() {
    if let Some(g) = CONNECTIONS.get() {
        g.dec();
    }
}

#[inline]
pub fn record_message(kind: &str) {
    if let Some(c) = MESSAGES_RECEIVED.get() {
        c.with_label_values(&[kind]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        record_command("chat", "help", 0.001);
        record_command_error("chat", "invalid_arguments");
        connection_added();
        record_message("channel_message");
        let output = gather_metrics();
        assert!(output.contains("slircbot_commands_total"));
        assert!(output.contains("slircbot_command_errors_total"));
        assert!(output.contains("slircbot_messages_received_total"));
    }
}
