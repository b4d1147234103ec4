//! Shared fixtures for integration tests

#![allow(dead_code)]

use futures::future::BoxFuture;
use futures::FutureExt;
use openssl::ssl::{SslAcceptor, SslMethod};
use sniff_gate::session::{DetectError, FailureHook, PeekBuffer, SessionHandler};
use sniff_gate::{Result, SharedConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// What a handler or hook observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started { handler: &'static str, buffer: Vec<u8> },
    Failed { reason: &'static str },
}

/// Handler that records its start and then drops the connection
pub struct RecordingHandler {
    pub name: &'static str,
    pub events: mpsc::UnboundedSender<Event>,
}

impl SessionHandler<TcpStream> for RecordingHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn start(&self, stream: TcpStream, buffer: PeekBuffer, _config: Arc<SharedConfig>) -> BoxFuture<'static, Result<()>> {
        let _ = self.events.send(Event::Started {
            handler: self.name,
            buffer: buffer.to_vec(),
        });
        async move {
            drop(stream);
            Ok::<(), sniff_gate::ProxyError>(())
        }
        .boxed()
    }
}

/// Failure hook that records the reason tag
pub struct RecordingHook {
    pub events: mpsc::UnboundedSender<Event>,
}

impl FailureHook for RecordingHook {
    fn report(&self, _peer: Option<SocketAddr>, error: &DetectError) {
        let _ = self.events.send(Event::Failed { reason: error.reason() });
    }
}

/// Shared configuration without a certificate; enough for detection tests
pub fn bare_shared_config() -> Arc<SharedConfig> {
    let acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap().build();
    Arc::new(SharedConfig::new(acceptor, "."))
}

/// A ClientHello-shaped record: 5-byte header plus handshake payload
pub fn client_hello() -> Vec<u8> {
    let payload_len: usize = 0x31;
    let mut hello = vec![0x16, 0x03, 0x01, 0x00, payload_len as u8];
    hello.extend_from_slice(&[0x01, 0x00, 0x00, (payload_len - 4) as u8, 0x03, 0x03]);
    hello.resize(5 + payload_len, 0x5a);
    hello
}

/// Echo server that returns everything it reads
pub async fn spawn_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    addr
}
