//! Capital weights from value scores.

use crate::domain::error::DcaError;

/// Normalize scores so they sum to 1: `weights[i] = scores[i] / sum(scores)`.
///
/// A zero (or non-finite) sum has no defined allocation. Negative scores are
/// allowed and can yield negative weights; they are reported but not clamped.
pub fn assign_weights(scores: &[f64]) -> Result<Vec<f64>, DcaError> {
    let total: f64 = scores.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(DcaError::DegenerateAllocation { total });
    }

    let weights: Vec<f64> = scores.iter().map(|s| s / total).collect();

    for (i, w) in weights.iter().enumerate() {
        if *w < 0.0 {
            tracing::warn!(index = i, weight = *w, "negative capital weight");
        }
    }

    Ok(weights)
}
