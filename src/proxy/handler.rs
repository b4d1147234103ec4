//! Built-in protocol handlers
//!
//! Both handlers forward to the same backend. `TlsTerminator` decrypts first;
//! `PlainForwarder` passes bytes through. Each replays the bytes consumed
//! during detection before reading from the live connection.

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, info};
use openssl::ssl::{NameType, Ssl};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_openssl::SslStream;

use crate::common::{ProxyError, Result};
use crate::config::{ServerConfig, SharedConfig};
use crate::session::{PeekBuffer, PrefixedStream, SessionHandler};

use super::forwarder::proxy_data;

/// Where and how to reach the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendSettings {
    pub addr: SocketAddr,
    pub connect_timeout: Duration,
    pub buffer_size: usize,
}

impl BackendSettings {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_secs(30),
            buffer_size: 8192,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            addr: config.backend_addr()?,
            connect_timeout: config.connect_timeout(),
            buffer_size: config.buffer_size,
        })
    }

    async fn connect(&self) -> Result<TcpStream> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(self.addr))
            .await
            .map_err(|_| ProxyError::Io(io::Error::new(io::ErrorKind::TimedOut, "Backend connection timed out")))?
            .map_err(ProxyError::Io)?;
        debug!("Connected to backend {}", self.addr);
        Ok(stream)
    }
}

/// Secure handler: terminates TLS with the shared acceptor, then forwards
#[derive(Debug, Clone)]
pub struct TlsTerminator {
    backend: BackendSettings,
}

impl TlsTerminator {
    pub fn new(backend: BackendSettings) -> Self {
        Self { backend }
    }
}

impl<S> SessionHandler<S> for TlsTerminator
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str {
        "tls"
    }

    fn start(&self, stream: S, buffer: PeekBuffer, config: Arc<SharedConfig>) -> BoxFuture<'static, Result<()>> {
        let backend = self.backend;
        async move {
            let ssl = Ssl::new(config.tls_acceptor().context())?;
            let mut tls = Box::pin(SslStream::new(ssl, PrefixedStream::new(buffer, stream))?);

            tls.as_mut()
                .accept()
                .await
                .map_err(|e| ProxyError::TlsHandshake(e.to_string()))?;

            info!(
                "TLS handshake complete ({}, SNI {})",
                tls.ssl().version_str(),
                tls.ssl().servername(NameType::HOST_NAME).unwrap_or("-")
            );

            let target = backend.connect().await?;
            proxy_data(tls, target, backend.buffer_size).await?;
            Ok(())
        }
        .boxed()
    }
}

/// Plain handler: forwards the connection as is
#[derive(Debug, Clone)]
pub struct PlainForwarder {
    backend: BackendSettings,
}

impl PlainForwarder {
    pub fn new(backend: BackendSettings) -> Self {
        Self { backend }
    }
}

impl<S> SessionHandler<S> for PlainForwarder
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &'static str {
        "plain"
    }

    fn start(&self, stream: S, buffer: PeekBuffer, _config: Arc<SharedConfig>) -> BoxFuture<'static, Result<()>> {
        let backend = self.backend;
        async move {
            let target = backend.connect().await?;
            proxy_data(PrefixedStream::new(buffer, stream), target, backend.buffer_size).await?;
            Ok(())
        }
        .boxed()
    }
}
