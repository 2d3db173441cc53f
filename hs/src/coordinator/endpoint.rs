//! Per-external connection state held by the coordinator

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::SyncError;
use crate::net::{Message, receive_message_within, send_message};

/// One accepted external
#[derive(Debug)]
pub struct ExternalEndpoint<S> {
    index: u32,
    stream: S,
    last_value: Option<f32>,
}

impl<S> ExternalEndpoint<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(index: u32, stream: S) -> Self {
        Self {
            index,
            stream,
            last_value: None,
        }
    }

    /// Number streams 1..N in the order they were accepted
    pub fn enumerate(streams: impl IntoIterator<Item = S>) -> Vec<Self> {
        streams
            .into_iter()
            .zip(1u32..)
            .map(|(stream, index)| Self::new(index, stream))
            .collect()
    }

    /// Accept-order index, 1-based
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Last temperature reported through this endpoint
    pub fn last_value(&self) -> Option<f32> {
        self.last_value
    }

    pub(crate) fn record(&mut self, value: f32) {
        self.last_value = Some(value);
    }

    pub(crate) async fn receive(&mut self, timeout: Option<Duration>) -> Result<Message, SyncError> {
        receive_message_within(&mut self.stream, timeout).await
    }

    pub(crate) async fn send(&mut self, message: &Message) -> Result<(), SyncError> {
        send_message(&mut self.stream, message).await
    }
}
