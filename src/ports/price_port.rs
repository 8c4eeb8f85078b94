//! Market price lookup port.

use crate::domain::error::DcaError;
use chrono::NaiveDate;

pub trait PriceLookup {
    /// Closing price of `ticker` on `date`.
    ///
    /// `Ok(None)` means the source has no data for that day. Callers treat it
    /// the same as an error.
    fn get_price(&self, ticker: &str, date: NaiveDate) -> Result<Option<f64>, DcaError>;
}
