//! Proxy module
//!
//! The listener that feeds detection sessions, and the built-in handlers
//! that forward classified connections to a backend.

mod forwarder;
mod handler;
pub mod server;

pub use forwarder::{proxy_data, TransferStats};
pub use handler::{BackendSettings, PlainForwarder, TlsTerminator};
pub use server::Server;
