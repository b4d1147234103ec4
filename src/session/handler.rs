//! Handler seam
//!
//! A `Dispatcher` bundles everything a `DetectSession` may hand a connection
//! to: the secure handler, the plain handler, the failure hook and the
//! classifier that chooses between them.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, warn};

use crate::common::{peer_label, Result};
use crate::config::SharedConfig;
use crate::protocol::{ProtocolDetector, TlsDetector};

use super::detect::DetectError;
use super::PeekBuffer;

/// A protocol handler that takes over a classified connection
///
/// `start` receives the connection, every byte read during detection (in
/// arrival order, not yet interpreted) and the shared configuration. From
/// that point the handler owns the connection.
pub trait SessionHandler<S>: Send + Sync + 'static {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Take ownership of the connection and drive it to completion
    fn start(
        &self,
        stream: S,
        buffer: PeekBuffer,
        config: Arc<SharedConfig>,
    ) -> BoxFuture<'static, Result<()>>;
}

/// Observer for connections that could not be classified
///
/// Reporting has no influence on control flow: the connection is closed
/// whatever the hook does.
pub trait FailureHook: Send + Sync + 'static {
    fn report(&self, peer: Option<SocketAddr>, error: &DetectError);
}

/// Failure hook that writes a log line per failed detection
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailureHook;

impl FailureHook for LogFailureHook {
    fn report(&self, peer: Option<SocketAddr>, error: &DetectError) {
        match error {
            DetectError::Timeout(_) => {
                warn!("detect: {} [{}]: {}", peer_label(peer), error.reason(), error)
            }
            DetectError::Transport(_) => {
                debug!("detect: {} [{}]: {}", peer_label(peer), error.reason(), error)
            }
        }
    }
}

/// Routing table for classified connections
pub struct Dispatcher<S> {
    pub(crate) secure: Arc<dyn SessionHandler<S>>,
    pub(crate) plain: Arc<dyn SessionHandler<S>>,
    pub(crate) failure: Arc<dyn FailureHook>,
    pub(crate) detector: Arc<dyn ProtocolDetector>,
}

impl<S: 'static> Dispatcher<S> {
    /// Create a dispatcher with TLS detection and log-only failure reporting
    pub fn new(
        secure: impl SessionHandler<S>,
        plain: impl SessionHandler<S>,
    ) -> Self {
        Self {
            secure: Arc::new(secure),
            plain: Arc::new(plain),
            failure: Arc::new(LogFailureHook),
            detector: Arc::new(TlsDetector::new()),
        }
    }

    /// Replace the failure hook
    pub fn with_failure_hook(mut self, hook: impl FailureHook) -> Self {
        self.failure = Arc::new(hook);
        self
    }

    /// Replace the classifier
    pub fn with_detector(mut self, detector: impl ProtocolDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }
}

impl<S> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            secure: Arc::clone(&self.secure),
            plain: Arc::clone(&self.plain),
            failure: Arc::clone(&self.failure),
            detector: Arc::clone(&self.detector),
        }
    }
}

impl<S: 'static> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("secure", &self.secure.name())
            .field("plain", &self.plain.name())
            .finish_non_exhaustive()
    }
}
