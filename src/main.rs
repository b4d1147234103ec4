//! Sniff Gate command line tool

use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use sniff_gate::common::{init_logger, parse_socket_addr, Result};
use sniff_gate::config::{ConfigBuilder, ServerConfig, ENV_PREFIX};
use sniff_gate::proxy::{BackendSettings, PlainForwarder, Server, TlsTerminator};
use sniff_gate::session::Dispatcher;
use sniff_gate::tls::{get_cert_fingerprint, get_cert_subject};
use sniff_gate::{APP_NAME, VERSION};

/// Serve TLS and plaintext clients on one port
#[derive(Parser, Debug)]
#[clap(author, version = VERSION, about, long_about = None)]
struct Args {
    /// Listen address
    #[clap(short, long)]
    listen: Option<String>,

    /// Backend address both protocols are forwarded to
    #[clap(short, long)]
    backend: Option<String>,

    /// Server certificate chain (PEM)
    #[clap(long)]
    cert: Option<PathBuf>,

    /// Server private key (PEM)
    #[clap(long)]
    key: Option<PathBuf>,

    /// Document root passed to protocol handlers
    #[clap(long)]
    doc_root: Option<PathBuf>,

    /// Seconds a client has to reveal its protocol
    #[clap(long)]
    detect_timeout: Option<u64>,

    /// Seconds to wait for the backend connection
    #[clap(long)]
    connect_timeout: Option<u64>,

    /// Forwarding buffer size in bytes
    #[clap(long)]
    buffer_size: Option<usize>,

    /// Log level
    #[clap(long)]
    log_level: Option<String>,

    /// Load configuration from a JSON file
    #[clap(long)]
    config_file: Option<PathBuf>,
}

impl Args {
    /// Command line values as the highest-priority configuration layer
    fn overrides(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::default();

        if let Some(listen) = &self.listen {
            config.listen = parse_socket_addr(listen)?;
        }
        if let Some(backend) = &self.backend {
            config.backend = backend.clone();
        }
        if let Some(cert) = &self.cert {
            config.cert = cert.clone();
        }
        if let Some(key) = &self.key {
            config.key = key.clone();
        }
        if let Some(doc_root) = &self.doc_root {
            config.doc_root = doc_root.clone();
        }
        if let Some(detect_timeout) = self.detect_timeout {
            config.detect_timeout = detect_timeout;
        }
        if let Some(connect_timeout) = self.connect_timeout {
            config.connect_timeout = connect_timeout;
        }
        if let Some(buffer_size) = self.buffer_size {
            config.buffer_size = buffer_size;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = ConfigBuilder::new()
        .with_env(ENV_PREFIX)
        .with_overrides(args.overrides()?);
    if let Some(path) = &args.config_file {
        builder = builder.with_file(path);
    }
    let config = builder.build()?;

    init_logger(&config.log_level);
    info!("Starting {} v{}", APP_NAME, VERSION);
    info!("Listen address: {}", config.listen);
    info!("Backend: {}", config.backend);
    info!("Document root: {}", config.doc_root.display());
    info!("Detection deadline: {:?}", config.detect_timeout());

    match get_cert_subject(&config.cert) {
        Ok(subject) => info!("Certificate subject: {}", subject),
        Err(e) => warn!("Unable to get certificate subject: {}", e),
    }
    match get_cert_fingerprint(&config.cert) {
        Ok(fingerprint) => info!("Certificate fingerprint: {}", fingerprint),
        Err(e) => warn!("Unable to get certificate fingerprint: {}", e),
    }

    let shared = Arc::new(config.build_shared()?);
    let backend = BackendSettings::from_config(&config)?;
    let dispatcher = Dispatcher::new(TlsTerminator::new(backend), PlainForwarder::new(backend));

    let server = Server::new(config.listen, shared, dispatcher)
        .with_detect_timeout(config.detect_timeout());

    info!("Ready, press Ctrl+C to stop");
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}
