//! Fill missing row fields from a fundamentals source.
//!
//! Values already present in the input are never overwritten. A lookup
//! failure leaves the row as read; scoring reports it if the price is still
//! missing.

use crate::domain::security::SecurityRow;
use crate::ports::fundamentals_port::{Fundamentals, FundamentalsLookup};

impl SecurityRow {
    /// True when a scoring input is absent.
    pub fn needs_fundamentals(&self) -> bool {
        self.price.is_none() || self.yield_pct.is_none() || self.stability.is_none()
    }

    /// Copy every field of `fields` that this row leaves empty.
    pub fn fill_missing(&mut self, fields: Fundamentals) {
        self.price = self.price.or(fields.price);
        self.yield_pct = self.yield_pct.or(fields.yield_pct);
        self.stability = self.stability.or(fields.stability);
        if self.sector.is_none() {
            self.sector = fields.sector;
        }
    }
}

pub fn fill_missing_fields(
    rows: Vec<SecurityRow>,
    lookup: &dyn FundamentalsLookup,
) -> Vec<SecurityRow> {
    rows.into_iter()
        .map(|mut row| {
            if !row.needs_fundamentals() {
                return row;
            }
            match lookup.get_fields(&row.ticker) {
                Ok(fields) => {
                    tracing::debug!(ticker = %row.ticker, ?fields, "fetched fundamentals");
                    row.fill_missing(fields);
                }
                Err(e) => {
                    tracing::warn!(ticker = %row.ticker, error = %e, "fundamentals unavailable");
                }
            }
            row
        })
        .collect()
}
