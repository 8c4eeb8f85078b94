//! Per-ticker fundamentals port.

use crate::domain::error::DcaError;

/// Current figures for one security; any of them may be unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fundamentals {
    pub price: Option<f64>,
    /// Dividend yield in percent.
    pub yield_pct: Option<f64>,
    /// Payout ratio as a fraction.
    pub stability: Option<f64>,
    pub sector: Option<String>,
}

pub trait FundamentalsLookup {
    fn get_fields(&self, ticker: &str) -> Result<Fundamentals, DcaError>;
}
