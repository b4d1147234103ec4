//! Listener
//!
//! Accepts connections on the single multiplexed port and starts a detection
//! session for each of them.

use log::{debug, error, info, trace};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinError, JoinSet};
use tokio::time::sleep;

use crate::common::{ProxyError, Result};
use crate::config::SharedConfig;
use crate::session::{DetectOutcome, DetectSession, Dispatcher, DETECT_TIMEOUT};

/// Pause after a failed accept
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Multiplexing server
///
/// Every accepted connection gets its own `DetectSession`, which hands the
/// connection to the secure or plain handler of the dispatcher.
pub struct Server {
    listen_addr: SocketAddr,
    config: Arc<SharedConfig>,
    dispatcher: Dispatcher<TcpStream>,
    detect_timeout: Duration,
}

impl Server {
    pub fn new(
        listen_addr: impl Into<SocketAddr>,
        config: Arc<SharedConfig>,
        dispatcher: Dispatcher<TcpStream>,
    ) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            config,
            dispatcher,
            detect_timeout: DETECT_TIMEOUT,
        }
    }

    /// Override the per-connection detection deadline
    pub fn with_detect_timeout(mut self, detect_timeout: Duration) -> Self {
        self.detect_timeout = detect_timeout;
        self
    }

    /// Bind and serve until an error occurs
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.listen_addr).await
            .map_err(ProxyError::Io)?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// Sessions that are still running when the listener stops are left to
    /// finish on their own.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Listening on {}", listener.local_addr()?);

        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }

                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!("Accepted connection from {}", peer);
                            if let Err(e) = stream.set_nodelay(true) {
                                debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                            }

                            let session = DetectSession::new(
                                stream,
                                Arc::clone(&self.config),
                                self.dispatcher.clone(),
                            )
                            .with_peer(peer)
                            .with_deadline(self.detect_timeout);

                            tasks.spawn(session.detect());
                        }
                        Err(e) => accept_failed(e).await,
                    }
                }

                Some(joined) = tasks.join_next() => {
                    log_session(joined);
                }
            }
        }

        let in_flight = tasks.len();
        tasks.detach_all();
        info!("Listener stopped, {} sessions still running", in_flight);
        Ok(())
    }
}

/// Out of descriptors and similar errors persist; give finishing sessions
/// time to release them before accepting again
async fn accept_failed(e: io::Error) {
    error!("Error accepting connection: {}", e);
    sleep(ACCEPT_BACKOFF).await;
}

fn log_session(joined: std::result::Result<DetectOutcome, JoinError>) {
    match joined {
        Ok(outcome) => trace!("Session finished in state {:?}", outcome.state()),
        Err(e) => error!("Session task error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::ssl::{SslAcceptor, SslMethod};
    use crate::proxy::{BackendSettings, PlainForwarder, TlsTerminator};

    #[test]
    fn test_server_new() {
        let acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap().build();
        let backend = BackendSettings::new("127.0.0.1:6000".parse().unwrap());
        let server = Server::new(
            "127.0.0.1:8443".parse::<SocketAddr>().unwrap(),
            Arc::new(SharedConfig::new(acceptor, ".")),
            Dispatcher::new(TlsTerminator::new(backend), PlainForwarder::new(backend)),
        )
        .with_detect_timeout(Duration::from_secs(5));

        assert_eq!(server.listen_addr.port(), 8443);
        assert_eq!(server.detect_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap().build();
        let backend = BackendSettings::new("127.0.0.1:6000".parse().unwrap());
        let server = Server::new(
            "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
            Arc::new(SharedConfig::new(acceptor, ".")),
            Dispatcher::new(TlsTerminator::new(backend), PlainForwarder::new(backend)),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        server.serve(listener, async {}).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_error_pauses_before_retry() {
        let start = tokio::time::Instant::now();
        accept_failed(io::Error::from_raw_os_error(24)).await;
        assert!(start.elapsed() >= ACCEPT_BACKOFF);
    }
}
