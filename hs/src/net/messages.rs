//! Wire record exchanged between central and externals
//!
//! Fixed 12-byte layout, little-endian, identical in both directions:
//!
//! ```text
//! offset  size  field
//!      0     4  kind          u32  (1 = TEMP_UPDATE, 2 = DONE)
//!      4     4  source_index  u32  (1..N from externals, 0 from central)
//!      8     4  value         f32  (IEEE-754 bits)
//! ```

use std::fmt;

use crate::error::SyncError;

/// Encoded length of every message
pub const MESSAGE_LEN: usize = 12;

/// Source index carried by central broadcasts
pub const CENTRAL_INDEX: u32 = 0;

/// Message kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A temperature report (external) or the next central value (central)
    TempUpdate = 1,

    /// Terminal broadcast carrying the converged central value
    Done = 2,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::TempUpdate => "TEMP_UPDATE",
            MessageKind::Done => "DONE",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = SyncError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(MessageKind::TempUpdate),
            2 => Ok(MessageKind::Done),
            other => Err(SyncError::UnknownKind(other)),
        }
    }
}

/// One protocol message
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub source_index: u32,
    pub value: f32,
}

impl Message {
    pub fn new(kind: MessageKind, source_index: u32, value: f32) -> Self {
        Self {
            kind,
            source_index,
            value,
        }
    }

    /// Report from external `index`
    pub fn report(index: u32, value: f32) -> Self {
        Self::new(MessageKind::TempUpdate, index, value)
    }

    /// Central broadcast: `Done` when the run is over, `TempUpdate` otherwise
    pub fn broadcast(value: f32, done: bool) -> Self {
        let kind = if done { MessageKind::Done } else { MessageKind::TempUpdate };
        Self::new(kind, CENTRAL_INDEX, value)
    }

    pub fn encode(&self) -> [u8; MESSAGE_LEN] {
        let mut buf = [0u8; MESSAGE_LEN];
        buf[0..4].copy_from_slice(&(self.kind as u32).to_le_bytes());
        buf[4..8].copy_from_slice(&self.source_index.to_le_bytes());
        buf[8..12].copy_from_slice(&self.value.to_bits().to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; MESSAGE_LEN]) -> Result<Self, SyncError> {
        let word = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);

        Ok(Self {
            kind: MessageKind::try_from(word(0))?,
            source_index: word(4),
            value: f32::from_bits(word(8)),
        })
    }

    /// Bitwise equality, so NaN payloads compare equal to themselves
    pub fn same_bits(&self, other: &Message) -> bool {
        self.kind == other.kind
            && self.source_index == other.source_index
            && self.value.to_bits() == other.value.to_bits()
    }
}
