//! Dual stack example
//!
//! Serves TLS and plaintext on 127.0.0.1:8443 with a throwaway self-signed
//! certificate and forwards both to a local echo server.
//!
//! ```text
//! printf 'hello\n' | nc 127.0.0.1 8443
//! openssl s_client -connect 127.0.0.1:8443 -quiet
//! ```

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use sniff_gate::common::init_logger;
use sniff_gate::proxy::{BackendSettings, PlainForwarder, TlsTerminator};
use sniff_gate::session::Dispatcher;
use sniff_gate::tls::{acceptor_from_parts, self_signed};
use sniff_gate::{Result, Server, SharedConfig};

async fn echo_backend() -> Result<std::net::SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                while let Ok(n) = stream.read(&mut buf).await {
                    if n == 0 || stream.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    Ok(addr)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger("debug");

    let (cert, key) = self_signed("localhost")?;
    let shared = Arc::new(SharedConfig::new(acceptor_from_parts(&cert, &key)?, "."));

    let backend = BackendSettings::new(echo_backend().await?);
    let dispatcher = Dispatcher::new(TlsTerminator::new(backend), PlainForwarder::new(backend));

    println!("Listening on 127.0.0.1:8443, press Ctrl+C to stop");
    Server::new(([127, 0, 0, 1], 8443), shared, dispatcher)
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
