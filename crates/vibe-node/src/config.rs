//! Node configuration.
//!
//! Settings are layered: built-in defaults, then an optional config file,
//! then `VIBE__*` environment variables (`VIBE__REALTIME__KEEPALIVE_SECS=5`),
//! then command-line flags applied by the binary.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use vibe_realtime::{
    RealtimeConfig, DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_PUSH_QUEUE_CAPACITY, DEFAULT_SOCKET_QUEUE_CAPACITY,
};

/// Prefix of environment variables read by [`NodeConfig::load`].
pub const ENV_PREFIX: &str = "VIBE";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid listen address '{0}': {1}")]
    Address(String, std::net::AddrParseError),
}

/// Configuration for the Vibe node.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// HTTP listen address.
    pub api_addr: String,
    /// Log level.
    pub log_level: String,
    /// Log format: `pretty` or `json`.
    pub log_format: String,
    pub realtime: RealtimeSettings,
    pub media: MediaSettings,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_addr: "127.0.0.1:8000".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            realtime: RealtimeSettings::default(),
            media: MediaSettings::default(),
        }
    }
}

/// Realtime fan-out settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// Seconds of idleness before a push stream sends a keep-alive.
    pub keepalive_secs: u64,
    pub push_queue_capacity: usize,
    pub socket_queue_capacity: usize,
    /// Per-transport connection limit.
    pub max_connections: usize,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            keepalive_secs: DEFAULT_KEEPALIVE_INTERVAL.as_secs(),
            push_queue_capacity: DEFAULT_PUSH_QUEUE_CAPACITY,
            socket_queue_capacity: DEFAULT_SOCKET_QUEUE_CAPACITY,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Media upload settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Largest accepted decoded upload, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl NodeConfig {
    /// Loads configuration from an optional file plus the environment.
    ///
    /// The file format is inferred from its extension (toml, yaml, json, ...).
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parsed HTTP listen address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.api_addr
            .parse()
            .map_err(|e| ConfigError::Address(self.api_addr.clone(), e))
    }

    /// Configuration handed to the realtime core.
    pub fn realtime_config(&self) -> RealtimeConfig {
        RealtimeConfig {
            keepalive_interval: Duration::from_secs(self.realtime.keepalive_secs.max(1)),
            push_queue_capacity: self.realtime.push_queue_capacity,
            socket_queue_capacity: self.realtime.socket_queue_capacity,
            max_connections: self.realtime.max_connections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_realtime_core() {
        let config = NodeConfig::default();
        assert_eq!(config.realtime_config(), RealtimeConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "api_addr = \"0.0.0.0:9000\"\nlog_format = \"json\"\n\n[realtime]\nkeepalive_secs = 5\n"
        )
        .unwrap();

        let config = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api_addr, "0.0.0.0:9000");
        assert_eq!(config.log_format, "json");
        assert_eq!(config.realtime.keepalive_secs, 5);
        // Unset values keep their defaults.
        assert_eq!(config.realtime.push_queue_capacity, DEFAULT_PUSH_QUEUE_CAPACITY);
        assert_eq!(config.media, MediaSettings::default());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = NodeConfig::load(Some(Path::new("/nonexistent/vibe.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_invalid_address() {
        let config = NodeConfig {
            api_addr: "not-an-address".to_string(),
            ..NodeConfig::default()
        };
        assert!(matches!(config.socket_addr(), Err(ConfigError::Address(..))));
    }
}
