//! Central side of connection setup
//!
//! Binds the listening socket and accepts exactly the configured number of
//! externals. Accept order becomes each external's endpoint index.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, info};

use crate::error::SyncError;

/// Bind a listener with address reuse so a restarted central can rebind at once
pub fn bind_listener(addr: SocketAddr, backlog: u32) -> Result<TcpListener, SyncError> {
    debug!(%addr, backlog, "bind_listener: called");
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(backlog)?;
    info!(addr = %listener.local_addr()?, "Listening for externals");
    Ok(listener)
}

/// Accept `expected` connections, in order
///
/// With a timeout, failing to gather every external in time is reported as a
/// connection count mismatch rather than blocking forever.
pub async fn accept_externals(
    listener: &TcpListener,
    expected: usize,
    timeout: Option<Duration>,
) -> Result<Vec<TcpStream>, SyncError> {
    debug!(expected, ?timeout, "accept_externals: called");
    let mut streams = Vec::with_capacity(expected);

    let gather = async {
        while streams.len() < expected {
            let (stream, peer) = listener.accept().await?;
            stream.set_nodelay(true)?;
            info!(%peer, endpoint = streams.len() + 1, "External connected");
            streams.push(stream);
        }
        Ok::<_, SyncError>(())
    };

    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, gather).await.ok(),
        None => Some(gather.await),
    };

    match outcome {
        Some(result) => result?,
        None => {
            return Err(SyncError::ConnectionCountMismatch {
                expected,
                connected: streams.len(),
            });
        }
    }

    info!(count = streams.len(), "All externals connected");
    Ok(streams)
}
