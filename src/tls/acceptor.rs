//! TLS acceptor creation
//!
//! The acceptor is the cryptographic context shared by every secure session.
//! It is built once at startup and never changed afterwards.

use log::{debug, info};
use openssl::pkey::{PKeyRef, Private};
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};
use openssl::x509::X509Ref;
use std::path::Path;

use crate::common::{ProxyError, Result};

fn builder() -> Result<SslAcceptorBuilder> {
    let builder = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls())?;
    debug!("Using Mozilla intermediate TLS profile");
    Ok(builder)
}

/// Create a TLS acceptor from PEM certificate chain and key files
///
/// # Example
///
/// ```no_run
/// # use std::path::Path;
/// # use sniff_gate::tls::create_tls_acceptor;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let acceptor = create_tls_acceptor(
///     Path::new("certs/server.crt"),
///     Path::new("certs/server.key"),
/// )?;
/// # Ok(())
/// # }
/// ```
pub fn create_tls_acceptor(cert_path: &Path, key_path: &Path) -> Result<SslAcceptor> {
    let mut acceptor = builder()?;

    acceptor.set_certificate_chain_file(cert_path).map_err(|e| {
        ProxyError::Certificate(format!("Failed to load {}: {}", cert_path.display(), e))
    })?;
    acceptor.set_private_key_file(key_path, SslFiletype::PEM).map_err(|e| {
        ProxyError::Certificate(format!("Failed to load {}: {}", key_path.display(), e))
    })?;
    acceptor.check_private_key()?;

    info!("TLS acceptor ready with certificate {}", cert_path.display());
    Ok(acceptor.build())
}

/// Create a TLS acceptor from an in-memory certificate and key
pub fn acceptor_from_parts(cert: &X509Ref, key: &PKeyRef<Private>) -> Result<SslAcceptor> {
    let mut acceptor = builder()?;
    acceptor.set_certificate(cert)?;
    acceptor.set_private_key(key)?;
    acceptor.check_private_key()?;
    Ok(acceptor.build())
}
