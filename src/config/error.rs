//! Configuration errors

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while resolving a `ServerConfig`
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("cannot read configuration file {}: {}", .0.display(), .1)]
    FileRead(PathBuf, #[source] io::Error),

    /// JSON syntax or type errors in the configuration file
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// `SNIFF_GATE_*` variables that do not fit the configuration schema
    #[error("bad environment configuration: {0}")]
    Environment(String),

    #[error("invalid value for '{0}': {1}")]
    InvalidValue(String, String),

    /// The gateway would forward to itself
    #[error("backend {0} is the listen address")]
    ForwardingLoop(SocketAddr),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Malformed(err.to_string())
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(err: ::config::ConfigError) -> Self {
        ConfigError::Environment(err.to_string())
    }
}

impl From<ConfigError> for crate::common::ProxyError {
    fn from(err: ConfigError) -> Self {
        crate::common::ProxyError::Config(err.to_string())
    }
}
