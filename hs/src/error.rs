//! Protocol error types

use std::time::Duration;
use thiserror::Error;

/// Errors that end a run
///
/// Every variant is fatal: the side that sees it drops its streams and exits.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("External index {index} out of range 1..={externals}")]
    InvalidIndex { index: u32, externals: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Expected {expected} externals but only {connected} connected")]
    ConnectionCountMismatch { expected: usize, connected: usize },

    #[error("Channel error: {0}")]
    Channel(#[from] std::io::Error),

    #[error("Channel closed after {transferred} of {expected} bytes")]
    ChannelClosed { transferred: usize, expected: usize },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Unknown message kind {0}")]
    UnknownKind(u32),

    #[error("Unexpected {kind} message from external {source_index}")]
    UnexpectedKind { kind: &'static str, source_index: u32 },

    #[error("Report from external index {index} out of range 1..={externals}")]
    IndexOutOfRange { index: u32, externals: usize },

    #[error("Duplicate report from external {index} in iteration {iteration}")]
    DuplicateReport { index: u32, iteration: u32 },

    #[error("Missing report from external {index} in iteration {iteration}")]
    MissingReport { index: u32, iteration: u32 },

    /// `source_index` 0 is the central's own aggregate
    #[error("Non-finite temperature {value} from index {source_index} in iteration {iteration}")]
    NonFiniteTemperature { value: f32, source_index: u32, iteration: u32 },
}

impl SyncError {
    /// Rejected before any connection was made or while peers were joining
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidIndex { .. } | SyncError::InvalidConfig(_) | SyncError::ConnectionCountMismatch { .. }
        )
    }

    /// The byte stream failed underneath the protocol
    pub fn is_channel_failure(&self) -> bool {
        matches!(
            self,
            SyncError::Channel(_) | SyncError::ChannelClosed { .. } | SyncError::Timeout(_)
        )
    }

    /// A peer sent something the protocol does not allow
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            SyncError::UnknownKind(_)
                | SyncError::UnexpectedKind { .. }
                | SyncError::IndexOutOfRange { .. }
                | SyncError::DuplicateReport { .. }
                | SyncError::MissingReport { .. }
                | SyncError::NonFiniteTemperature { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_exclusive() {
        let errors = vec![
            SyncError::InvalidIndex { index: 9, externals: 4 },
            SyncError::InvalidConfig("bad".to_string()),
            SyncError::ConnectionCountMismatch {
                expected: 4,
                connected: 3,
            },
            SyncError::Channel(std::io::Error::from(std::io::ErrorKind::BrokenPipe)),
            SyncError::ChannelClosed {
                transferred: 4,
                expected: 12,
            },
            SyncError::Timeout(Duration::from_secs(1)),
            SyncError::UnknownKind(7),
            SyncError::UnexpectedKind {
                kind: "DONE",
                source_index: 1,
            },
            SyncError::IndexOutOfRange { index: 5, externals: 4 },
            SyncError::DuplicateReport { index: 2, iteration: 1 },
            SyncError::MissingReport { index: 3, iteration: 1 },
            SyncError::NonFiniteTemperature {
                value: f32::INFINITY,
                source_index: 0,
                iteration: 2,
            },
        ];

        for err in errors {
            let hits = [err.is_startup(), err.is_channel_failure(), err.is_protocol_violation()]
                .iter()
                .filter(|hit| **hit)
                .count();
            assert_eq!(hits, 1, "{err} should fall in exactly one class");
        }
    }

    #[test]
    fn test_display_mentions_index() {
        let err = SyncError::InvalidIndex { index: 0, externals: 4 };
        assert_eq!(err.to_string(), "External index 0 out of range 1..=4");
    }

    #[test]
    fn test_io_error_converts() {
        let err: SyncError = std::io::Error::from(std::io::ErrorKind::ConnectionReset).into();
        assert!(err.is_channel_failure());
    }
}
