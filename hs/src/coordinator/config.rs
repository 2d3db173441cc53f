//! Coordinator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::SyncError;

/// How the collect phase waits on the externals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectMode {
    /// Block on each endpoint in accept order
    #[default]
    Sequential,

    /// Wait on all endpoints at once, then validate in accept order
    Concurrent,
}

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Number of externals taking part in the run
    pub externals: usize,

    /// Convergence tolerance
    pub epsilon: f32,

    /// Per-receive limit; `None` blocks indefinitely
    pub receive_timeout: Option<Duration>,

    /// Collect strategy
    pub collect: CollectMode,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        debug!("CoordinatorConfig::default: called");
        Self {
            externals: crate::DEFAULT_EXTERNALS,
            epsilon: crate::DEFAULT_EPSILON,
            receive_timeout: None,
            collect: CollectMode::Sequential,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_externals(mut self, externals: usize) -> Self {
        self.externals = externals;
        self
    }

    pub fn with_collect(mut self, collect: CollectMode) -> Self {
        self.collect = collect;
        self
    }

    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        debug!(externals = self.externals, epsilon = self.epsilon, "CoordinatorConfig::validate: called");
        if self.externals == 0 {
            return Err(SyncError::InvalidConfig("externals must be at least 1".to_string()));
        }
        if u32::try_from(self.externals).is_err() {
            return Err(SyncError::InvalidConfig(format!("{} externals do not fit the wire index", self.externals)));
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(SyncError::InvalidConfig(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
