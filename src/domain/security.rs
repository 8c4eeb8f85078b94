//! Security rows and their scored/weighted stages.

use std::collections::HashSet;

use serde::Deserialize;

use crate::domain::error::DcaError;

/// One candidate security as ingested, before any scoring.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SecurityRow {
    pub ticker: String,
    /// Intrinsic-value estimate.
    pub value: f64,
    #[serde(default)]
    pub price: Option<f64>,
    /// Dividend yield in percent.
    #[serde(default, alias = "yield")]
    pub yield_pct: Option<f64>,
    /// Payout-ratio style risk figure; lower is better.
    #[serde(default)]
    pub stability: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
}

impl SecurityRow {
    pub fn new(ticker: &str, value: f64, price: f64) -> Self {
        SecurityRow {
            ticker: ticker.to_string(),
            value,
            price: Some(price),
            yield_pct: None,
            stability: None,
            sector: None,
        }
    }

    pub fn with_yield(mut self, yield_pct: f64) -> Self {
        self.yield_pct = Some(yield_pct);
        self
    }

    pub fn with_stability(mut self, stability: f64) -> Self {
        self.stability = Some(stability);
        self
    }

    /// Ingestion-boundary checks on a single row.
    pub fn validate(&self) -> Result<(), DcaError> {
        if self.ticker.trim().is_empty() {
            return Err(DcaError::invalid_input("<blank>", "ticker is empty"));
        }
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(DcaError::invalid_input(
                &self.ticker,
                format!("value must be a positive number, got {}", self.value),
            ));
        }
        for (field, v) in [
            ("price", self.price),
            ("yield_pct", self.yield_pct),
            ("stability", self.stability),
        ] {
            if v.is_some_and(|v| !v.is_finite()) {
                return Err(DcaError::invalid_input(
                    &self.ticker,
                    format!("{field} is not a finite number"),
                ));
            }
        }
        if let Some(s) = self.stability.filter(|s| !(0.0..=1.0).contains(s)) {
            tracing::warn!(
                ticker = %self.ticker,
                stability = s,
                "stability outside [0, 1]; scoring will use it as-is"
            );
        }
        Ok(())
    }
}

/// Validates every row and rejects duplicate tickers within the batch.
pub fn validate_batch(rows: &[SecurityRow]) -> Result<(), DcaError> {
    let mut seen = HashSet::new();
    for row in rows {
        row.validate()?;
        let ticker = row.ticker.trim().to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(DcaError::DuplicateTicker(ticker));
        }
    }
    Ok(())
}

/// A row whose value score has been computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSecurity {
    pub row: SecurityRow,
    pub value_score: f64,
}

/// A row carrying both its score and its share of capital.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSecurity {
    pub row: SecurityRow,
    pub value_score: f64,
    pub weight: f64,
}

impl WeightedSecurity {
    pub fn ticker(&self) -> &str {
        &self.row.ticker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_minimal_row() {
        let row = SecurityRow {
            ticker: "BHP".into(),
            value: 45.0,
            price: None,
            yield_pct: None,
            stability: None,
            sector: None,
        };
        assert!(row.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_ticker() {
        let row = SecurityRow::new("  ", 10.0, 10.0);
        assert!(matches!(row.validate(), Err(DcaError::InvalidInput { .. })));
    }

    #[test]
    fn validate_rejects_non_positive_value() {
        let row = SecurityRow::new("BHP", 0.0, 10.0);
        assert!(matches!(
            row.validate(),
            Err(DcaError::InvalidInput { ticker, .. }) if ticker == "BHP"
        ));
    }

    #[test]
    fn validate_rejects_nan_yield() {
        let row = SecurityRow::new("BHP", 10.0, 10.0).with_yield(f64::NAN);
        assert!(row.validate().is_err());
    }

    #[test]
    fn out_of_range_stability_is_only_a_warning() {
        let row = SecurityRow::new("BHP", 10.0, 10.0).with_stability(1.4);
        assert!(row.validate().is_ok());
    }

    #[test]
    fn validate_batch_rejects_duplicates_case_insensitively() {
        let rows = vec![
            SecurityRow::new("BHP", 10.0, 10.0),
            SecurityRow::new("bhp", 11.0, 10.0),
        ];
        assert!(matches!(
            validate_batch(&rows),
            Err(DcaError::DuplicateTicker(t)) if t == "BHP"
        ));
    }
}
