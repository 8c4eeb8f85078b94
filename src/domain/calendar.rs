//! Buy-date sequencing.
//!
//! Expands `(start, end, cadence)` into the ordered buy dates. The first date
//! is always `start`; each later date is the previous one advanced by the
//! cadence, until the next one would pass `end`.

use chrono::NaiveDate;

use super::cadence::Cadence;

/// Lazy, single-pass iterator over cadence dates in `[start, end]`.
#[derive(Debug, Clone)]
pub struct DateSequence {
    current: Option<NaiveDate>,
    end: NaiveDate,
    cadence: Cadence,
}

impl DateSequence {
    pub fn new(start: NaiveDate, end: NaiveDate, cadence: Cadence) -> Self {
        DateSequence {
            current: Some(start),
            end,
            cadence,
        }
    }
}

impl Iterator for DateSequence {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let date = self.current.filter(|d| *d <= self.end);
        self.current = date.and_then(|d| self.cadence.advance(d));
        date
    }
}

impl std::iter::FusedIterator for DateSequence {}

/// Materialize the full buy-date schedule.
pub fn generate_dates(start: NaiveDate, end: NaiveDate, cadence: Cadence) -> Vec<NaiveDate> {
    DateSequence::new(start, end, cadence).collect()
}
