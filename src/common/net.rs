//! Network helpers

use std::net::{SocketAddr, ToSocketAddrs};

use super::error::{ProxyError, Result};

/// Parse a `host:port` string into a socket address
///
/// Literal addresses are parsed directly; anything else goes through name
/// resolution and the first resolved address wins.
pub fn parse_socket_addr(addr: &str) -> Result<SocketAddr> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        return Ok(socket_addr);
    }

    addr.to_socket_addrs()
        .map_err(|e| ProxyError::Config(format!("Failed to parse address {}: {}", addr, e)))?
        .next()
        .ok_or_else(|| ProxyError::Config(format!("Address resolved to nothing: {}", addr)))
}

/// Render an optional peer address for log lines
pub fn peer_label(peer: Option<SocketAddr>) -> String {
    match peer {
        Some(addr) => addr.to_string(),
        None => "<unknown peer>".to_string(),
    }
}
