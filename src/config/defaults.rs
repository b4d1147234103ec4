//! Default configuration values
//!
//! Single source of truth for defaults, shared by serde, the merger and the
//! command line.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "SNIFF_GATE";

/// Environment variable naming the configuration file
pub const CONFIG_FILE_ENV: &str = "SNIFF_GATE_CONFIG_FILE";

/// Default backend address as string
pub const BACKEND_STR: &str = "127.0.0.1:8080";

/// Default certificate chain path
pub const CERT_PATH_STR: &str = "certs/server.crt";

/// Default private key path
pub const KEY_PATH_STR: &str = "certs/server.key";

/// Default document root
pub const DOC_ROOT_STR: &str = ".";

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Default listen address
pub fn listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8443))
}

pub fn backend() -> String {
    BACKEND_STR.to_string()
}

pub fn cert_path() -> PathBuf {
    PathBuf::from(CERT_PATH_STR)
}

pub fn key_path() -> PathBuf {
    PathBuf::from(KEY_PATH_STR)
}

pub fn doc_root() -> PathBuf {
    PathBuf::from(DOC_ROOT_STR)
}

pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

/// Protocol detection deadline in seconds
pub fn detect_timeout() -> u64 {
    30
}

/// Backend connect timeout in seconds
pub fn connect_timeout() -> u64 {
    30
}

/// Forwarding buffer size (8KB)
pub fn buffer_size() -> usize {
    8192
}
