//! CSV file price adapter.
//!
//! Reads `{base}/{TICKER}_{MARKET}.csv` files with a `date,close` header
//! (extra columns ignored). Each file is parsed once and cached for the
//! lifetime of the adapter.

use crate::domain::error::DcaError;
use crate::ports::price_port::PriceLookup;
use chrono::NaiveDate;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct PriceRecord {
    date: String,
    close: Option<f64>,
}

pub struct CsvPriceAdapter {
    base_path: PathBuf,
    market: String,
    cache: RefCell<HashMap<String, BTreeMap<NaiveDate, f64>>>,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf, market: &str) -> Self {
        Self {
            base_path,
            market: market.to_string(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", ticker.to_uppercase(), self.market))
    }

    fn load(&self, ticker: &str) -> Result<BTreeMap<NaiveDate, f64>, DcaError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| DcaError::Csv {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut closes = BTreeMap::new();

        for result in rdr.deserialize::<PriceRecord>() {
            let record = result.map_err(|e| DcaError::Csv {
                reason: format!("{}: {}", path.display(), e),
            })?;
            let date = NaiveDate::parse_from_str(record.date.trim(), "%Y-%m-%d").map_err(|e| {
                DcaError::Csv {
                    reason: format!("{}: invalid date '{}': {}", path.display(), record.date, e),
                }
            })?;
            if let Some(close) = record.close {
                closes.insert(date, close);
            }
        }

        tracing::debug!(ticker, rows = closes.len(), path = %path.display(), "loaded prices");
        Ok(closes)
    }
}

impl PriceLookup for CsvPriceAdapter {
    fn get_price(&self, ticker: &str, date: NaiveDate) -> Result<Option<f64>, DcaError> {
        let key = ticker.to_uppercase();
        if !self.cache.borrow().contains_key(&key) {
            let closes = self.load(ticker)?;
            self.cache.borrow_mut().insert(key.clone(), closes);
        }
        Ok(self
            .cache
            .borrow()
            .get(&key)
            .and_then(|closes| closes.get(&date).copied()))
    }
}
