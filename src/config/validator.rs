//! Configuration validator

use std::path::Path;
use log::warn;

use crate::common::{check_dir_exists, check_file_exists, parse_socket_addr};
use crate::config::ServerConfig;
use crate::config::error::{ConfigError, Result};

/// Validate the configuration
pub fn validate_config(config: &ServerConfig) -> Result<()> {
    validate_network_settings(config)?;
    validate_certificate_settings(config)?;
    validate_general_settings(config)?;
    Ok(())
}

fn validate_network_settings(config: &ServerConfig) -> Result<()> {
    let backend = parse_socket_addr(&config.backend)
        .map_err(|e| ConfigError::InvalidValue("backend".to_string(), e.to_string()))?;

    if backend == config.listen {
        return Err(ConfigError::ForwardingLoop(backend));
    }

    Ok(())
}

fn validate_certificate_settings(config: &ServerConfig) -> Result<()> {
    validate_file_exists(&config.cert, "cert")?;
    validate_file_exists(&config.key, "key")?;
    Ok(())
}

fn validate_general_settings(config: &ServerConfig) -> Result<()> {
    match config.log_level.as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => {}
        level => warn!("Unknown log level: {}. RUST_LOG syntax is passed through as is", level),
    }

    check_dir_exists(&config.doc_root)
        .map_err(|e| ConfigError::InvalidValue("doc_root".to_string(), e.to_string()))?;

    for (name, value) in [
        ("buffer_size", config.buffer_size as u64),
        ("detect_timeout", config.detect_timeout),
        ("connect_timeout", config.connect_timeout),
    ] {
        if value == 0 {
            return Err(ConfigError::InvalidValue(
                name.to_string(),
                "must be greater than 0".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_file_exists(path: &Path, name: &str) -> Result<()> {
    check_file_exists(path).map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
