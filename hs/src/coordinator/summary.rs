//! Results of a finished coordinator run

use serde::{Deserialize, Serialize};

/// What one round saw and decided
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub iteration: u32,
    pub central_before: f32,
    pub central_after: f32,
    /// Reports indexed by `source_index - 1`
    pub externals: Vec<f32>,
    pub stable: bool,
}

/// Outcome of a run that reached DONE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub iterations: u32,
    pub final_central: f32,
    pub final_externals: Vec<f32>,
    pub rounds: Vec<RoundRecord>,
}

impl RunSummary {
    /// Largest gap between any two of the final values, central included
    pub fn spread(&self) -> f32 {
        let values = std::iter::once(self.final_central).chain(self.final_externals.iter().copied());
        let (lo, hi) = values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        hi - lo
    }
}
