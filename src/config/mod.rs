//! Configuration module
//!
//! `ServerConfig` is the user-facing configuration, loaded from defaults, a
//! JSON file, the environment and the command line. `SharedConfig` is the
//! runtime object built from it once at startup and shared by every
//! connection.

mod defaults;
mod error;
mod loader;
mod merger;
mod shared;
mod validator;

pub use self::defaults::{CONFIG_FILE_ENV, ENV_PREFIX};
pub use self::error::ConfigError;
pub use self::loader::ConfigBuilder;
pub use self::merger::ConfigMerger;
pub use self::shared::SharedConfig;
pub use self::validator::validate_config;

use serde::{Deserialize, Deserializer, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::{parse_socket_addr, Result};
use crate::tls::create_tls_acceptor;

/// Custom deserializer for socket addresses
fn deserialize_socket_addr<'de, D>(deserializer: D) -> std::result::Result<SocketAddr, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_socket_addr(&s).map_err(serde::de::Error::custom)
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the multiplexed listener binds to
    #[serde(default = "defaults::listen", deserialize_with = "deserialize_socket_addr")]
    pub listen: SocketAddr,

    /// Backend that both TLS and plaintext traffic is forwarded to (host:port)
    #[serde(default = "defaults::backend")]
    pub backend: String,

    /// PEM certificate chain presented to TLS clients
    #[serde(default = "defaults::cert_path")]
    pub cert: PathBuf,

    /// PEM private key for `cert`
    #[serde(default = "defaults::key_path")]
    pub key: PathBuf,

    /// Document root handed to protocol handlers
    #[serde(default = "defaults::doc_root")]
    pub doc_root: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "defaults::log_level")]
    pub log_level: String,

    /// Seconds a new connection has to reveal its protocol
    #[serde(default = "defaults::detect_timeout")]
    pub detect_timeout: u64,

    /// Seconds to wait for the backend connection
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout: u64,

    /// Buffer size for data transfer (in bytes)
    #[serde(default = "defaults::buffer_size")]
    pub buffer_size: usize,

    /// File this configuration was read from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: defaults::listen(),
            backend: defaults::backend(),
            cert: defaults::cert_path(),
            key: defaults::key_path(),
            doc_root: defaults::doc_root(),
            log_level: defaults::log_level(),
            detect_timeout: defaults::detect_timeout(),
            connect_timeout: defaults::connect_timeout(),
            buffer_size: defaults::buffer_size(),
            config_file: None,
        }
    }
}

impl ServerConfig {
    pub fn detect_timeout(&self) -> Duration {
        Duration::from_secs(self.detect_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Resolve the backend address
    pub fn backend_addr(&self) -> Result<SocketAddr> {
        parse_socket_addr(&self.backend)
    }

    /// Check the values a server cannot start with
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validate_config(self)
    }

    /// Build the shared runtime configuration (loads the TLS context)
    pub fn build_shared(&self) -> Result<SharedConfig> {
        let acceptor = create_tls_acceptor(&self.cert, &self.key)?;
        Ok(SharedConfig::new(acceptor, self.doc_root.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen.to_string(), "0.0.0.0:8443");
        assert_eq!(config.backend, "127.0.0.1:8080");
        assert_eq!(config.detect_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_serde_round_trip_keeps_defaults() {
        let json = serde_json::to_string(&ServerConfig::default()).unwrap();
        assert!(!json.contains("config_file"));

        let parsed: ServerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, ServerConfig::default());
    }

    #[test]
    fn test_build_shared_needs_certificate() {
        let config = ServerConfig {
            cert: "missing.crt".into(),
            ..ServerConfig::default()
        };
        assert!(config.build_shared().is_err());
    }
}
