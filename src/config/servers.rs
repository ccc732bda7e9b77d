//! Server block configuration for outbound bot connections.

use serde::Deserialize;

use super::defaults::{default_port, default_true};

/// Server block: one network the bot can connect to.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerBlock {
    /// Registry label for this connection (e.g., "libera").
    pub label: String,
    /// Remote server IP/hostname to connect to.
    pub host: String,
    /// Remote server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether to use TLS for this connection.
    #[serde(default)]
    pub tls: bool,
    /// Whether to verify the remote certificate (only applies when tls = true).
    /// Set to false only for testing or self-signed certs.
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    /// Server password sent with PASS before registration.
    #[serde(default)]
    pub password: Option<String>,
    /// SASL PLAIN credentials.
    #[serde(default)]
    pub sasl: Option<SaslConfig>,
    /// Whether to connect at startup.
    #[serde(default)]
    pub autoconnect: bool,
    /// Channels joined once registration completes.
    #[serde(default)]
    pub channels: Vec<String>,
}

impl ServerBlock {
    /// Build an ad-hoc block from a `host[:port]` string, labelled by that string.
    pub fn from_address(address: &str) -> Option<Self> {
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => (host, port.parse().ok()?),
            None => (address, default_port()),
        };
        if host.is_empty() || port == 0 {
            return None;
        }
        Some(Self {
            label: address.to_string(),
            host: host.to_string(),
            port,
            tls: false,
            verify_cert: true,
            password: None,
            sasl: None,
            autoconnect: false,
            channels: Vec::new(),
        })
    }

    /// `host:port` form used for logging and the `list` command.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SASL PLAIN account credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct SaslConfig {
    pub account: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_address_with_port() {
        let block = ServerBlock::from_address("irc.example.net:6697").unwrap();
        assert_eq!(block.label, "irc.example.net:6697");
        assert_eq!(block.host, "irc.example.net");
        assert_eq!(block.port, 6697);
        assert!(!block.tls);
    }

    #[test]
    fn from_address_defaults_port() {
        let block = ServerBlock::from_address("irc.example.net").unwrap();
        assert_eq!(block.port, 6667);
        assert_eq!(block.address(), "irc.example.net:6667");
    }

    #[test]
    fn from_address_rejects_garbage() {
        assert!(ServerBlock::from_address("host:notaport").is_none());
        assert!(ServerBlock::from_address(":6667").is_none());
        assert!(ServerBlock::from_address("host:0").is_none());
    }

    #[test]
    fn block_defaults() {
        let block: ServerBlock = toml::from_str(
            r#"
            label = "test"
            host = "localhost"
            "#,
        )
        .unwrap();
        assert_eq!(block.port, 6667);
        assert!(block.verify_cert);
        assert!(!block.autoconnect);
        assert!(block.channels.is_empty());
        assert!(block.sasl.is_none());
    }
}
