//! Agent configuration

use std::time::Duration;

use crate::error::SyncError;

/// Startup parameters of one external
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Stable identity 1..=externals
    pub index: u32,

    /// Seed temperature sent in the first report
    pub initial_temperature: f32,

    /// Number of externals in the run, shared with the central
    pub externals: usize,

    /// Per-receive limit; `None` blocks indefinitely
    pub receive_timeout: Option<Duration>,
}

impl AgentConfig {
    pub fn new(index: u32, initial_temperature: f32, externals: usize) -> Self {
        Self {
            index,
            initial_temperature,
            externals,
            receive_timeout: None,
        }
    }

    pub fn with_receive_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.receive_timeout = timeout;
        self
    }

    /// Reject bad startup parameters before any connection is attempted
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.externals == 0 {
            return Err(SyncError::InvalidConfig("externals must be at least 1".to_string()));
        }
        if self.index == 0 || self.index as usize > self.externals {
            return Err(SyncError::InvalidIndex {
                index: self.index,
                externals: self.externals,
            });
        }
        if !self.initial_temperature.is_finite() {
            return Err(SyncError::InvalidConfig(format!(
                "initial temperature must be finite, got {}",
                self.initial_temperature
            )));
        }
        Ok(())
    }
}
