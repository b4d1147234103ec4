//! Configuration loading
//!
//! Priority, lowest first:
//! 1. Built-in defaults
//! 2. JSON configuration file
//! 3. `SNIFF_GATE_*` environment variables
//! 4. Command line overrides

use std::path::{Path, PathBuf};
use log::debug;
use ::config::{Config, Environment};

use crate::config::error::{ConfigError, Result};
use crate::config::merger::ConfigMerger;
use crate::config::{defaults, ServerConfig};

impl ServerConfig {
    /// Load a configuration file (JSON)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let mut config: ServerConfig = serde_json::from_str(&content)?;
        config.config_file = Some(path.to_path_buf());

        debug!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables with the given prefix
    ///
    /// `PREFIX_DETECT_TIMEOUT=10` sets `detect_timeout`, and so on.
    pub fn from_env(prefix: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize::<ServerConfig>()?)
    }
}

/// Configuration builder
///
/// Collects the sources and resolves them in priority order on `build`.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    file: Option<PathBuf>,
    env_prefix: Option<String>,
    overrides: Option<ServerConfig>,
    skip_validation: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this configuration file (it must exist)
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read environment variables with this prefix
    pub fn with_env(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Apply command line values on top of everything else
    pub fn with_overrides(mut self, overrides: ServerConfig) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Skip validation (file existence checks and value ranges)
    pub fn without_validation(mut self) -> Self {
        self.skip_validation = true;
        self
    }

    pub fn build(self) -> Result<ServerConfig> {
        let env = match &self.env_prefix {
            Some(prefix) => Some(ServerConfig::from_env(prefix)?),
            None => None,
        };

        // An explicit path wins over one named in the environment
        let file_path = self.file.clone()
            .or_else(|| env.as_ref().and_then(|e| e.config_file.clone()))
            .or_else(|| std::env::var(defaults::CONFIG_FILE_ENV).ok().map(PathBuf::from));

        let mut config = ServerConfig::default();
        if let Some(path) = file_path {
            config = config.merge(&ServerConfig::from_file(&path)?);
        }
        if let Some(env) = env {
            config = config.merge(&env);
        }
        if let Some(overrides) = self.overrides {
            config = config.merge(&overrides);
        }

        if !self.skip_validation {
            config.validate()?;
        }

        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{
            "listen": "127.0.0.1:9443",
            "backend": "127.0.0.1:9080",
            "detect_timeout": 5,
            "buffer_size": 16384
        }"#).unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.listen.to_string(), "127.0.0.1:9443");
        assert_eq!(config.backend, "127.0.0.1:9080");
        assert_eq!(config.detect_timeout, 5);
        assert_eq!(config.buffer_size, 16384);
        assert_eq!(config.connect_timeout, defaults::connect_timeout());
        assert_eq!(config.config_file.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_from_missing_file() {
        assert!(matches!(
            ServerConfig::from_file("does-not-exist.json"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_from_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "listen": "not an address" }"#).unwrap();
        assert!(matches!(ServerConfig::from_file(&path), Err(ConfigError::Malformed(_))));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("SNIFF_GATE_TEST_A_DETECT_TIMEOUT", "7");
        std::env::set_var("SNIFF_GATE_TEST_A_BACKEND", "127.0.0.1:7000");

        let config = ServerConfig::from_env("SNIFF_GATE_TEST_A").unwrap();

        std::env::remove_var("SNIFF_GATE_TEST_A_DETECT_TIMEOUT");
        std::env::remove_var("SNIFF_GATE_TEST_A_BACKEND");

        assert_eq!(config.detect_timeout, 7);
        assert_eq!(config.backend, "127.0.0.1:7000");
        assert_eq!(config.buffer_size, defaults::buffer_size());
    }

    #[test]
    #[serial]
    fn test_priority_file_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "detect_timeout": 5, "buffer_size": 1024, "backend": "127.0.0.1:1000" }"#).unwrap();

        std::env::set_var("SNIFF_GATE_TEST_B_BUFFER_SIZE", "2048");

        let overrides = ServerConfig {
            backend: "127.0.0.1:3000".to_string(),
            ..ServerConfig::default()
        };
        let config = ConfigBuilder::new()
            .with_file(&path)
            .with_env("SNIFF_GATE_TEST_B")
            .with_overrides(overrides)
            .without_validation()
            .build();

        std::env::remove_var("SNIFF_GATE_TEST_B_BUFFER_SIZE");
        let config = config.unwrap();

        assert_eq!(config.detect_timeout, 5, "file beats default");
        assert_eq!(config.buffer_size, 2048, "env beats file");
        assert_eq!(config.backend, "127.0.0.1:3000", "overrides beat file");
    }
}
