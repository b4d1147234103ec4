//! End-to-end tests through the built-in handlers
//!
//! One listener, one echo backend: a TLS client and a plaintext client both
//! get their bytes echoed back, proving the sniffed bytes reached the
//! handshake and the backend respectively.

mod common;

use common::spawn_echo_backend;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use sniff_gate::proxy::{BackendSettings, PlainForwarder, TlsTerminator};
use sniff_gate::session::Dispatcher;
use sniff_gate::tls::{acceptor_from_parts, self_signed};
use sniff_gate::{Server, SharedConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_openssl::SslStream;

async fn start_gateway() -> (SocketAddr, oneshot::Sender<()>) {
    let backend = BackendSettings::new(spawn_echo_backend().await);

    let (cert, key) = self_signed("localhost").unwrap();
    let shared = Arc::new(SharedConfig::new(acceptor_from_parts(&cert, &key).unwrap(), "."));
    let dispatcher = Dispatcher::new(TlsTerminator::new(backend), PlainForwarder::new(backend));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(addr, shared, dispatcher);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

#[tokio::test]
async fn test_tls_client_is_terminated_and_forwarded() {
    let (addr, _shutdown) = start_gateway().await;

    let mut connector = SslConnector::builder(SslMethod::tls()).unwrap();
    connector.set_verify(SslVerifyMode::NONE);
    let ssl = connector.build().configure().unwrap().into_ssl("localhost").unwrap();

    let tcp = TcpStream::connect(addr).await.unwrap();
    let mut tls = Box::pin(SslStream::new(ssl, tcp).unwrap());
    timeout(Duration::from_secs(5), tls.as_mut().connect())
        .await
        .expect("handshake timed out")
        .expect("handshake failed");

    tls.write_all(b"hello over tls").await.unwrap();
    let mut echoed = [0u8; 14];
    timeout(Duration::from_secs(5), tls.read_exact(&mut echoed))
        .await
        .expect("echo timed out")
        .unwrap();
    assert_eq!(&echoed, b"hello over tls");
}

#[tokio::test]
async fn test_plain_client_is_forwarded_byte_for_byte() {
    let (addr, _shutdown) = start_gateway().await;
    let request = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(request).await.unwrap();

    let mut echoed = vec![0u8; request.len()];
    timeout(Duration::from_secs(5), client.read_exact(&mut echoed))
        .await
        .expect("echo timed out")
        .unwrap();
    assert_eq!(&echoed[..], &request[..]);
}

#[tokio::test]
async fn test_both_protocols_share_one_port() {
    let (addr, _shutdown) = start_gateway().await;

    let mut plain = TcpStream::connect(addr).await.unwrap();

    let mut connector = SslConnector::builder(SslMethod::tls()).unwrap();
    connector.set_verify(SslVerifyMode::NONE);
    let ssl = connector.build().configure().unwrap().into_ssl("localhost").unwrap();
    let mut tls = Box::pin(SslStream::new(ssl, TcpStream::connect(addr).await.unwrap()).unwrap());
    tls.as_mut().connect().await.unwrap();

    plain.write_all(b"plain").await.unwrap();
    tls.write_all(b"secure").await.unwrap();

    let mut plain_echo = [0u8; 5];
    let mut tls_echo = [0u8; 6];
    plain.read_exact(&mut plain_echo).await.unwrap();
    tls.read_exact(&mut tls_echo).await.unwrap();

    assert_eq!(&plain_echo, b"plain");
    assert_eq!(&tls_echo, b"secure");
}
