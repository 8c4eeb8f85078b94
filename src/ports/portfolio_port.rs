//! Brokerage portfolio directory port.

use crate::domain::error::DcaError;

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub market: String,
}

pub trait PortfolioDirectory {
    fn list_portfolios(&self) -> Result<Vec<PortfolioSummary>, DcaError>;

    fn list_holdings(&self, portfolio_id: i64) -> Result<Vec<Holding>, DcaError>;

    fn create_portfolio(&self, name: &str) -> Result<(), DcaError>;

    fn delete_portfolio(&self, portfolio_id: i64) -> Result<(), DcaError>;
}
