//! Data forwarding module
//!
//! Copies bytes in both directions between a client stream and a backend
//! stream until both sides are done.

use log::debug;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::Result;

/// Bytes moved by one forwarding session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub client_to_target: u64,
    pub target_to_client: u64,
}

/// Forward data between two streams
///
/// Each direction is half-closed when its source reaches EOF. An error in
/// either direction ends the whole session.
pub async fn proxy_data<C, T>(client: C, target: T, buffer_size: usize) -> Result<TransferStats>
where
    C: AsyncRead + AsyncWrite + Unpin,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_reader, mut client_writer) = tokio::io::split(client);
    let (mut target_reader, mut target_writer) = tokio::io::split(target);

    let (client_to_target, target_to_client) = tokio::try_join!(
        pump(&mut client_reader, &mut target_writer, buffer_size),
        pump(&mut target_reader, &mut client_writer, buffer_size),
    )?;

    debug!(
        "Forwarding finished: {} bytes to target, {} bytes to client",
        client_to_target, target_to_client
    );

    Ok(TransferStats {
        client_to_target,
        target_to_client,
    })
}

async fn pump<R, W>(reader: &mut R, writer: &mut W, buffer_size: usize) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; buffer_size];
    let mut total_bytes = 0u64;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n]).await?;
        total_bytes += n as u64;
    }

    writer.shutdown().await?;
    Ok(total_bytes)
}
