//! Update rules and the stability predicate
//!
//! All arithmetic is single precision, matching the 4-byte values carried on
//! the wire, and sums run in index order so every run is reproducible.

/// New central value: the central votes twice, each external once
///
/// `(2 * central + sum(externals)) / (N + 2)`
pub fn weighted_central(central: f32, externals: &[f32]) -> f32 {
    let sum: f32 = externals.iter().sum();
    (2.0 * central + sum) / (externals.len() as f32 + 2.0)
}

/// New external value: 60/40 toward the external's own prior value
///
/// `(3 * external + 2 * central) / 5`
pub fn blend_external(external: f32, central: f32) -> f32 {
    (3.0 * external + 2.0 * central) / 5.0
}

/// Whether a round leaves the whole system settled
///
/// `external_prev` is `None` on the first round, which is never stable.
/// Otherwise the central delta and every external delta must be strictly
/// below `epsilon`.
pub fn is_stable(current: f32, previous: f32, external_now: &[f32], external_prev: Option<&[f32]>, epsilon: f32) -> bool {
    let Some(external_prev) = external_prev else {
        return false;
    };

    if external_now.len() != external_prev.len() {
        return false;
    }

    (current - previous).abs() < epsilon
        && external_now
            .iter()
            .zip(external_prev)
            .all(|(now, prev)| (now - prev).abs() < epsilon)
}
