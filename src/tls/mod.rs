//! TLS handling module
//!
//! Builds the shared TLS acceptor and inspects certificates.

mod acceptor;
mod cert;

pub use acceptor::{acceptor_from_parts, create_tls_acceptor};
pub use cert::{get_cert_fingerprint, get_cert_subject, load_cert, self_signed};
