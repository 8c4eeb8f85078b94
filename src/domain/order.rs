//! Trade orders handed to the brokerage.

use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    Buy,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Buy => "BUY",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic per-order key, `TICKER-YYYY-MM-DD`.
pub fn unique_identifier(ticker: &str, date: NaiveDate) -> String {
    format!("{}-{}", ticker, date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeOrder {
    pub unique_identifier: String,
    pub ticker: String,
    pub market: String,
    pub transaction_type: TransactionType,
    pub transaction_date: NaiveDate,
    pub portfolio_id: i64,
    pub quantity: f64,
    pub price: f64,
    pub exchange_rate: f64,
}

impl TradeOrder {
    pub fn buy(
        ticker: &str,
        market: &str,
        date: NaiveDate,
        portfolio_id: i64,
        quantity: f64,
        price: f64,
    ) -> Self {
        TradeOrder {
            unique_identifier: unique_identifier(ticker, date),
            ticker: ticker.to_string(),
            market: market.to_string(),
            transaction_type: TransactionType::Buy,
            transaction_date: date,
            portfolio_id,
            quantity,
            price,
            exchange_rate: 1.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.quantity > 0.0 && self.quantity.is_finite() && self.price > 0.0
    }

    pub fn gross_value(&self) -> f64 {
        self.quantity * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn identifier_is_ticker_and_iso_date() {
        assert_eq!(unique_identifier("BHP", d(2024, 3, 5)), "BHP-2024-03-05");
    }

    #[test]
    fn buy_sets_defaults() {
        let order = TradeOrder::buy("CBA", "ASX", d(2024, 1, 2), 42, 12.5, 100.0);
        assert_eq!(order.unique_identifier, "CBA-2024-01-02");
        assert_eq!(order.transaction_type, TransactionType::Buy);
        assert_eq!(order.transaction_type.to_string(), "BUY");
        assert_eq!(order.exchange_rate, 1.0);
        assert_eq!(order.portfolio_id, 42);
        assert!(order.is_valid());
        assert_eq!(order.gross_value(), 1250.0);
    }

    #[test]
    fn non_positive_quantity_is_invalid() {
        let order = TradeOrder::buy("CBA", "ASX", d(2024, 1, 2), 42, -0.1, 100.0);
        assert!(!order.is_valid());
    }
}
