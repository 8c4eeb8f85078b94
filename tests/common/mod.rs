#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use valuedca::domain::error::DcaError;
use valuedca::domain::order::TradeOrder;
use valuedca::domain::security::SecurityRow;
use valuedca::ports::fundamentals_port::{Fundamentals, FundamentalsLookup};
use valuedca::ports::order_port::OrderSubmission;
use valuedca::ports::price_port::PriceLookup;

/// Price source with a default price per ticker and per-date overrides.
pub struct MockPriceLookup {
    pub prices: HashMap<String, f64>,
    pub overrides: HashMap<(String, NaiveDate), f64>,
    pub missing: HashSet<(String, NaiveDate)>,
    pub errors: HashSet<(String, NaiveDate)>,
    pub calls: RefCell<Vec<(String, NaiveDate)>>,
}

impl MockPriceLookup {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            overrides: HashMap::new(),
            missing: HashSet::new(),
            errors: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_price(mut self, ticker: &str, price: f64) -> Self {
        self.prices.insert(ticker.to_string(), price);
        self
    }

    pub fn with_price_on(mut self, ticker: &str, date: NaiveDate, price: f64) -> Self {
        self.overrides.insert((ticker.to_string(), date), price);
        self
    }

    pub fn without_price_on(mut self, ticker: &str, date: NaiveDate) -> Self {
        self.missing.insert((ticker.to_string(), date));
        self
    }

    pub fn with_error_on(mut self, ticker: &str, date: NaiveDate) -> Self {
        self.errors.insert((ticker.to_string(), date));
        self
    }
}

impl PriceLookup for MockPriceLookup {
    fn get_price(&self, ticker: &str, date: NaiveDate) -> Result<Option<f64>, DcaError> {
        let key = (ticker.to_string(), date);
        self.calls.borrow_mut().push(key.clone());
        if self.errors.contains(&key) {
            return Err(DcaError::Api {
                reason: "connection reset".into(),
            });
        }
        if self.missing.contains(&key) {
            return Ok(None);
        }
        if let Some(p) = self.overrides.get(&key) {
            return Ok(Some(*p));
        }
        Ok(self.prices.get(ticker).copied())
    }
}

/// Records every submitted order; identifiers listed in `reject` fail.
pub struct RecordingOrders {
    pub submitted: RefCell<Vec<TradeOrder>>,
    pub reject: HashSet<String>,
}

impl RecordingOrders {
    pub fn new() -> Self {
        Self {
            submitted: RefCell::new(Vec::new()),
            reject: HashSet::new(),
        }
    }

    pub fn rejecting(mut self, identifier: &str) -> Self {
        self.reject.insert(identifier.to_string());
        self
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.submitted
            .borrow()
            .iter()
            .map(|o| o.unique_identifier.clone())
            .collect()
    }
}

impl OrderSubmission for RecordingOrders {
    fn submit(&self, order: &TradeOrder) -> Result<(), DcaError> {
        if self.reject.contains(&order.unique_identifier) {
            return Err(DcaError::Submission {
                identifier: order.unique_identifier.clone(),
                reason: "HTTP 422 duplicate trade".into(),
            });
        }
        self.submitted.borrow_mut().push(order.clone());
        Ok(())
    }
}

/// Fundamentals keyed by ticker; unknown tickers fail like a network error.
pub struct MockFundamentals {
    pub fields: HashMap<String, Fundamentals>,
    pub calls: RefCell<Vec<String>>,
}

impl MockFundamentals {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with(mut self, ticker: &str, price: f64, yield_pct: f64, stability: f64) -> Self {
        self.fields.insert(
            ticker.to_string(),
            Fundamentals {
                price: Some(price),
                yield_pct: Some(yield_pct),
                stability: Some(stability),
                sector: Some("Financials".to_string()),
            },
        );
        self
    }
}

impl FundamentalsLookup for MockFundamentals {
    fn get_fields(&self, ticker: &str) -> Result<Fundamentals, DcaError> {
        self.calls.borrow_mut().push(ticker.to_string());
        self.fields.get(ticker).cloned().ok_or_else(|| DcaError::Api {
            reason: format!("{ticker}: HTTP 404"),
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn row(ticker: &str, value: f64, price: f64) -> SecurityRow {
    SecurityRow::new(ticker, value, price)
}
