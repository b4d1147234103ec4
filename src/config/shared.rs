//! Process-wide read-only configuration
//!
//! `SharedConfig` is built once before the listener accepts anything and is
//! handed to every session behind an `Arc`. Nothing in it is mutable.

use openssl::ssl::SslAcceptor;
use std::fmt;
use std::path::{Path, PathBuf};

/// Data every connection may read: the TLS context and the document root
pub struct SharedConfig {
    tls: SslAcceptor,
    doc_root: PathBuf,
}

impl SharedConfig {
    pub fn new(tls: SslAcceptor, doc_root: impl Into<PathBuf>) -> Self {
        Self {
            tls,
            doc_root: doc_root.into(),
        }
    }

    /// TLS context used by the secure handler
    pub fn tls_acceptor(&self) -> &SslAcceptor {
        &self.tls
    }

    /// Root directory for content served by downstream handlers
    pub fn doc_root(&self) -> &Path {
        &self.doc_root
    }
}

// SslAcceptor has no Debug impl
impl fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConfig")
            .field("tls", &"<SslAcceptor>")
            .field("doc_root", &self.doc_root)
            .finish()
    }
}
