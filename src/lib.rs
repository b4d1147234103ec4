//! Sniff Gate: one port for TLS and plaintext
//!
//! Accepts connections on a single listening socket and decides from the
//! first bytes of each one whether the peer is starting a TLS handshake.
//! The connection is then handed, together with every byte already read, to
//! exactly one of two handlers: a secure handler or a plain handler.
//!
//! # Main Features
//!
//! - Asynchronous classification under a hard deadline (30 seconds by default)
//! - Lossless hand-off: the peek buffer moves into the chosen handler
//! - Pluggable handlers and failure reporting through small traits
//! - Built-in handlers that terminate TLS with OpenSSL or pass plaintext
//!   through, forwarding both to one backend
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use sniff_gate::{create_tls_acceptor, Result, Server, SharedConfig};
//! use sniff_gate::proxy::{BackendSettings, PlainForwarder, TlsTerminator};
//! use sniff_gate::session::Dispatcher;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let acceptor = create_tls_acceptor(
//!         Path::new("certs/server.crt"),
//!         Path::new("certs/server.key"),
//!     )?;
//!     let shared = Arc::new(SharedConfig::new(acceptor, "/var/www"));
//!
//!     let backend = BackendSettings::new("127.0.0.1:8080".parse().unwrap());
//!     let dispatcher = Dispatcher::new(
//!         TlsTerminator::new(backend),
//!         PlainForwarder::new(backend),
//!     );
//!
//!     Server::new(([0, 0, 0, 0], 8443), shared, dispatcher).run().await
//! }
//! ```

pub mod common;
pub mod config;
pub mod protocol;
pub mod proxy;
pub mod session;
pub mod tls;

pub use common::{ProxyError, Result, parse_socket_addr};
pub use config::{ServerConfig, SharedConfig};
pub use proxy::Server;
pub use session::{DetectOutcome, DetectSession, Dispatcher, SessionHandler};
pub use tls::create_tls_acceptor;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
