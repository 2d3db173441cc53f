//! External side of connection setup

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::SyncError;

/// Dial the central once; there is no reconnect
pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<TcpStream, SyncError> {
    debug!(%addr, ?timeout, "connect: called");
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| SyncError::Timeout(timeout))??;
    stream.set_nodelay(true)?;
    info!(%addr, "Connected to central");
    Ok(stream)
}
