//! Value-weighted allocation over a batch of securities.
//!
//! Scores every row, normalizes the scores into weights, and returns the rows
//! ranked by score with each row still paired to its own weight.

use crate::domain::error::DcaError;
use crate::domain::score::score_rows;
use crate::domain::security::{validate_batch, ScoredSecurity, SecurityRow, WeightedSecurity};
use crate::domain::weights::assign_weights;

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub entries: Vec<WeightedSecurity>,
}

impl Allocation {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scored rows and weights as parallel sequences, in ranked order.
    pub fn split(&self) -> (Vec<ScoredSecurity>, Vec<f64>) {
        self.entries
            .iter()
            .map(|e| {
                (
                    ScoredSecurity {
                        row: e.row.clone(),
                        value_score: e.value_score,
                    },
                    e.weight,
                )
            })
            .unzip()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }
}

pub fn build_allocation(rows: Vec<SecurityRow>) -> Result<Allocation, DcaError> {
    validate_batch(&rows)?;
    let scored = score_rows(rows)?;
    let scores: Vec<f64> = scored.iter().map(|s| s.value_score).collect();
    let weights = assign_weights(&scores)?;

    let mut entries: Vec<WeightedSecurity> = scored
        .into_iter()
        .zip(weights)
        .map(|(s, weight)| WeightedSecurity {
            row: s.row,
            value_score: s.value_score,
            weight,
        })
        .collect();

    // Stable sort keeps input order among equal scores.
    entries.sort_by(|a, b| b.value_score.total_cmp(&a.value_score));

    tracing::info!(securities = entries.len(), "allocation built");
    Ok(Allocation { entries })
}
