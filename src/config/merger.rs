//! Configuration merging
//!
//! Layers are merged lowest priority first. A field of the higher layer wins
//! whenever it differs from the built-in default.

use crate::config::ServerConfig;

/// Trait for merging configurations
pub trait ConfigMerger {
    /// Merge `other` (higher priority) over `self`
    fn merge(&self, other: &Self) -> Self where Self: Sized;
}

impl ConfigMerger for ServerConfig {
    fn merge(&self, other: &Self) -> Self {
        let default = Self::default();

        fn pick<T: Clone + PartialEq>(current: &T, other: &T, default: &T) -> T {
            if other != default {
                other.clone()
            } else {
                current.clone()
            }
        }

        Self {
            listen: pick(&self.listen, &other.listen, &default.listen),
            backend: pick(&self.backend, &other.backend, &default.backend),
            cert: pick(&self.cert, &other.cert, &default.cert),
            key: pick(&self.key, &other.key, &default.key),
            doc_root: pick(&self.doc_root, &other.doc_root, &default.doc_root),
            log_level: pick(&self.log_level, &other.log_level, &default.log_level),
            detect_timeout: pick(&self.detect_timeout, &other.detect_timeout, &default.detect_timeout),
            connect_timeout: pick(&self.connect_timeout, &other.connect_timeout, &default.connect_timeout),
            buffer_size: pick(&self.buffer_size, &other.buffer_size, &default.buffer_size),
            config_file: other.config_file.clone().or_else(|| self.config_file.clone()),
        }
    }
}
