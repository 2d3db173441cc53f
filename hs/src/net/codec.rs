//! Full-transfer send and receive of wire records
//!
//! A record either crosses the stream whole or the call fails. Short reads
//! and writes are retried until all 12 bytes moved; a zero-length transfer
//! means the peer is gone.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use super::messages::{MESSAGE_LEN, Message};
use crate::error::SyncError;

/// Write one message, looping over partial writes
pub async fn send_message<S>(stream: &mut S, message: &Message) -> Result<(), SyncError>
where
    S: AsyncWrite + Unpin,
{
    let buf = message.encode();
    let mut written = 0;

    while written < MESSAGE_LEN {
        match stream.write(&buf[written..]).await {
            Ok(0) => {
                return Err(SyncError::ChannelClosed {
                    transferred: written,
                    expected: MESSAGE_LEN,
                });
            }
            Ok(n) => {
                written += n;
                trace!(written, "send_message: partial write");
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SyncError::Channel(e)),
        }
    }

    stream.flush().await?;
    debug!(?message, "send_message: sent");
    Ok(())
}

/// Read one message, looping over partial reads
pub async fn receive_message<S>(stream: &mut S) -> Result<Message, SyncError>
where
    S: AsyncRead + Unpin,
{
    let mut buf = [0u8; MESSAGE_LEN];
    let mut read = 0;

    while read < MESSAGE_LEN {
        match stream.read(&mut buf[read..]).await {
            Ok(0) => {
                return Err(SyncError::ChannelClosed {
                    transferred: read,
                    expected: MESSAGE_LEN,
                });
            }
            Ok(n) => {
                read += n;
                trace!(read, "receive_message: partial read");
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SyncError::Channel(e)),
        }
    }

    let message = Message::decode(&buf)?;
    debug!(?message, "receive_message: received");
    Ok(message)
}

/// Read one message, giving up after `timeout` when one is set
pub async fn receive_message_within<S>(stream: &mut S, timeout: Option<Duration>) -> Result<Message, SyncError>
where
    S: AsyncRead + Unpin,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, receive_message(stream))
            .await
            .map_err(|_| SyncError::Timeout(limit))?,
        None => receive_message(stream).await,
    }
}
