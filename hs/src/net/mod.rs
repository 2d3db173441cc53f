//! Byte-stream transport between the central and its externals
//!
//! Every exchange is one fixed 12-byte record in both directions. The
//! listener and client only establish TCP streams; the codec works over any
//! `AsyncRead + AsyncWrite` so tests can use in-memory pipes.

use std::net::SocketAddr;

use eyre::{Context, Result};

pub mod client;
pub mod codec;
pub mod listener;
pub mod messages;

pub use client::connect;
pub use codec::{receive_message, receive_message_within, send_message};
pub use listener::{accept_externals, bind_listener};
pub use messages::{MESSAGE_LEN, Message, MessageKind};

/// Resolve a `host:port` pair into a socket address
pub fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .context(format!("Invalid address {host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_addr_loopback() {
        let addr = resolve_addr("127.0.0.1", 2000).unwrap();
        assert_eq!(addr.port(), 2000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_resolve_addr_rejects_hostname_garbage() {
        assert!(resolve_addr("not an address", 2000).is_err());
    }
}
