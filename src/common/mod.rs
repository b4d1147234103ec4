//! Common module
//!
//! Shared error types and small utility functions used throughout the crate.

pub mod error;
pub mod fs;
pub mod log;
pub mod net;

pub use error::{ProxyError, Result};
pub use fs::{check_dir_exists, check_file_exists};
pub use log::init_logger;
pub use net::{parse_socket_addr, peer_label};
