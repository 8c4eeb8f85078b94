//! Value scoring.
//!
//! `score = w_yield * yield + w_stability * (1 - stability) + w_value * (value / price)`
//!
//! `w_value` is scaled by 0.8 when the security trades below its intrinsic
//! value and by 1.2 when it trades above it.

use crate::domain::error::DcaError;
use crate::domain::security::{ScoredSecurity, SecurityRow};

pub const WEIGHT_YIELD: f64 = 0.1;
pub const WEIGHT_STABILITY: f64 = 0.1;
pub const WEIGHT_VALUE: f64 = 0.8;

pub const UNDERVALUED_FACTOR: f64 = 0.8;
pub const OVERVALUED_FACTOR: f64 = 1.2;

/// Value weight after adjusting for where `value` sits relative to `price`.
pub fn adjusted_value_weight(value: f64, price: f64) -> f64 {
    if value > price {
        WEIGHT_VALUE * UNDERVALUED_FACTOR
    } else if value < price {
        WEIGHT_VALUE * OVERVALUED_FACTOR
    } else {
        WEIGHT_VALUE
    }
}

/// Compute the value score of a single row.
///
/// Absent yield and stability count as 0. The price must be present,
/// finite and strictly positive.
pub fn compute_score(row: &SecurityRow) -> Result<f64, DcaError> {
    let price = match row.price {
        None => return Err(DcaError::invalid_input(&row.ticker, "price is missing")),
        Some(p) if !p.is_finite() || p <= 0.0 => {
            return Err(DcaError::invalid_input(
                &row.ticker,
                format!("price must be positive, got {p}"),
            ));
        }
        Some(p) => p,
    };
    if !row.value.is_finite() {
        return Err(DcaError::invalid_input(&row.ticker, "value is not finite"));
    }

    let yield_pct = row.yield_pct.unwrap_or(0.0);
    let stability = row.stability.unwrap_or(0.0);
    let w_value = adjusted_value_weight(row.value, price);

    Ok(WEIGHT_YIELD * yield_pct
        + WEIGHT_STABILITY * (1.0 - stability)
        + w_value * (row.value / price))
}

/// Score a whole batch. The first invalid row aborts the batch.
pub fn score_rows(rows: Vec<SecurityRow>) -> Result<Vec<ScoredSecurity>, DcaError> {
    rows.into_iter()
        .map(|row| {
            let value_score = compute_score(&row)?;
            tracing::debug!(ticker = %row.ticker, value_score, "scored");
            Ok(ScoredSecurity { row, value_score })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn undervalued_row_discounts_value_weight() {
        let row = SecurityRow::new("A", 120.0, 100.0);
        // 0.1 * (1 - 0) + 0.64 * 1.2
        assert_relative_eq!(compute_score(&row).unwrap(), 0.868, epsilon = 1e-12);
    }

    #[test]
    fn overvalued_row_amplifies_value_weight() {
        let row = SecurityRow::new("B", 80.0, 100.0);
        // 0.1 + 0.96 * 0.8
        assert_relative_eq!(compute_score(&row).unwrap(), 0.868, epsilon = 1e-12);
    }

    #[test]
    fn fairly_priced_row_keeps_base_weight() {
        let row = SecurityRow::new("C", 50.0, 50.0);
        assert_relative_eq!(compute_score(&row).unwrap(), 0.9, epsilon = 1e-12);
    }

    #[test]
    fn yield_and_stability_contribute() {
        let row = SecurityRow::new("D", 50.0, 50.0)
            .with_yield(4.5)
            .with_stability(0.6);
        // 0.45 + 0.1 * 0.4 + 0.8
        assert_relative_eq!(compute_score(&row).unwrap(), 1.29, epsilon = 1e-12);
    }

    #[test]
    fn missing_price_is_invalid_input() {
        let mut row = SecurityRow::new("E", 10.0, 1.0);
        row.price = None;
        assert!(matches!(
            compute_score(&row),
            Err(DcaError::InvalidInput { ticker, .. }) if ticker == "E"
        ));
    }

    #[test]
    fn zero_price_is_invalid_input() {
        let row = SecurityRow::new("F", 10.0, 0.0);
        assert!(matches!(compute_score(&row), Err(DcaError::InvalidInput { .. })));
    }

    #[test]
    fn negative_price_is_invalid_input() {
        let row = SecurityRow::new("G", 10.0, -3.0);
        assert!(compute_score(&row).is_err());
    }

    #[test]
    fn score_is_deterministic() {
        let row = SecurityRow::new("H", 33.3, 27.1).with_yield(3.2);
        assert_eq!(compute_score(&row).unwrap(), compute_score(&row).unwrap());
    }

    #[test]
    fn score_rows_fails_whole_batch_on_bad_row() {
        let rows = vec![
            SecurityRow::new("A", 10.0, 10.0),
            SecurityRow::new("B", 10.0, 0.0),
        ];
        assert!(score_rows(rows).is_err());
    }

    #[test]
    fn score_rows_preserves_order() {
        let rows = vec![
            SecurityRow::new("A", 10.0, 10.0),
            SecurityRow::new("B", 20.0, 10.0),
        ];
        let scored = score_rows(rows).unwrap();
        assert_eq!(scored[0].row.ticker, "A");
        assert_eq!(scored[1].row.ticker, "B");
    }
}
