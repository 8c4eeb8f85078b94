//! Periodic trade scheduling and submission.
//!
//! For each weighted security the scheduler walks the cadence dates, prices
//! each date through a [`PriceLookup`], sizes a buy order net of the flat
//! brokerage fee, and hands it to an [`OrderSubmission`]. Missing prices and
//! failed submissions are recorded per order; only precondition violations
//! abort the run.

use chrono::NaiveDate;

use crate::domain::cadence::Cadence;
use crate::domain::calendar::generate_dates;
use crate::domain::error::DcaError;
use crate::domain::order::TradeOrder;
use crate::domain::security::ScoredSecurity;
use crate::ports::order_port::OrderSubmission;
use crate::ports::price_port::PriceLookup;

/// Flat brokerage cost deducted from every order before sizing.
pub const DEFAULT_FIXED_FEE: f64 = 9.95;
pub const DEFAULT_MARKET: &str = "ASX";

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    pub total_capital: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub portfolio_id: i64,
    pub cadence: Cadence,
    pub fixed_fee: f64,
    pub market: String,
}

impl ScheduleRequest {
    pub fn new(
        total_capital: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        portfolio_id: i64,
        cadence: Cadence,
    ) -> Self {
        ScheduleRequest {
            total_capital,
            start_date,
            end_date,
            portfolio_id,
            cadence,
            fixed_fee: DEFAULT_FIXED_FEE,
            market: DEFAULT_MARKET.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), DcaError> {
        if !self.total_capital.is_finite() || self.total_capital <= 0.0 {
            return Err(DcaError::invalid_input(
                "schedule",
                format!("total capital must be positive, got {}", self.total_capital),
            ));
        }
        if !self.fixed_fee.is_finite() || self.fixed_fee < 0.0 {
            return Err(DcaError::invalid_input(
                "schedule",
                format!("fixed fee must be non-negative, got {}", self.fixed_fee),
            ));
        }
        Ok(())
    }
}

/// Capital divisor: whole cadence periods in the span, at least one.
///
/// Derived from the day count alone, so it can differ from the number of
/// dates [`generate_dates`] produces for the same range.
pub fn num_buy_orders(start_date: NaiveDate, end_date: NaiveDate, cadence: Cadence) -> i64 {
    let num_days = (end_date - start_date).num_days();
    (num_days / cadence.period_days()).max(1)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    PriceUnavailable { reason: String },
    NonPositiveQuantity { quantity: f64 },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::PriceUnavailable { reason } => write!(f, "price unavailable: {reason}"),
            SkipReason::NonPositiveQuantity { quantity } => {
                write!(f, "non-positive quantity {quantity:.4} after fees")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOrder {
    pub date: NaiveDate,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedOrder {
    pub order: TradeOrder,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerReport {
    pub ticker: String,
    pub weight: f64,
    pub capital_per_order: f64,
    pub submitted: Vec<TradeOrder>,
    pub skipped: Vec<SkippedOrder>,
    pub failed: Vec<FailedOrder>,
}

impl TickerReport {
    fn new(ticker: &str, weight: f64, capital_per_order: f64) -> Self {
        TickerReport {
            ticker: ticker.to_string(),
            weight,
            capital_per_order,
            submitted: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    pub buy_orders: i64,
    pub dates: Vec<NaiveDate>,
    pub tickers: Vec<TickerReport>,
}

impl ScheduleReport {
    pub fn submitted_count(&self) -> usize {
        self.tickers.iter().map(|t| t.submitted_count()).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.tickers.iter().map(|t| t.skipped_count()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.tickers.iter().map(|t| t.failed_count()).sum()
    }

    pub fn ticker(&self, ticker: &str) -> Option<&TickerReport> {
        self.tickers.iter().find(|t| t.ticker == ticker)
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}

/// Resolve a usable price, folding "no data" and lookup errors together.
fn resolve_price(prices: &dyn PriceLookup, ticker: &str, date: NaiveDate) -> Result<f64, DcaError> {
    let unavailable = |reason: String| DcaError::PriceUnavailable {
        ticker: ticker.to_string(),
        date,
        reason,
    };
    match prices.get_price(ticker, date) {
        Ok(Some(p)) if p.is_finite() && p > 0.0 => Ok(p),
        Ok(Some(p)) => Err(unavailable(format!("unusable price {p}"))),
        Ok(None) => Err(unavailable("no price data".to_string())),
        Err(e @ DcaError::PriceUnavailable { .. }) => Err(e),
        Err(e) => Err(unavailable(e.to_string())),
    }
}

/// Build and submit every periodic buy order for the weighted rows.
///
/// `scored_rows` and `weights` are parallel sequences.
pub fn schedule_and_submit(
    request: &ScheduleRequest,
    scored_rows: &[ScoredSecurity],
    weights: &[f64],
    prices: &dyn PriceLookup,
    orders: &dyn OrderSubmission,
) -> Result<ScheduleReport, DcaError> {
    request.validate()?;
    if scored_rows.len() != weights.len() {
        return Err(DcaError::invalid_input(
            "schedule",
            format!(
                "{} rows but {} weights",
                scored_rows.len(),
                weights.len()
            ),
        ));
    }

    let buy_orders = num_buy_orders(request.start_date, request.end_date, request.cadence);
    let dates = generate_dates(request.start_date, request.end_date, request.cadence);

    tracing::info!(
        cadence = %request.cadence,
        start = %request.start_date,
        end = %request.end_date,
        buy_orders,
        dates = dates.len(),
        "scheduling periodic buys"
    );

    let mut tickers = Vec::with_capacity(scored_rows.len());

    for (scored, &weight) in scored_rows.iter().zip(weights) {
        let ticker = scored.row.ticker.as_str();
        let row_capital = request.total_capital * weight;
        let capital_per_order = row_capital / buy_orders as f64;
        let mut report = TickerReport::new(ticker, weight, capital_per_order);

        for &date in &dates {
            let price = match resolve_price(prices, ticker, date) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(%ticker, %date, error = %e, "skipping buy");
                    let reason = match e {
                        DcaError::PriceUnavailable { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    report.skipped.push(SkippedOrder {
                        date,
                        reason: SkipReason::PriceUnavailable { reason },
                    });
                    continue;
                }
            };

            let quantity = (capital_per_order - request.fixed_fee) / price;
            let order = TradeOrder::buy(
                ticker,
                &request.market,
                date,
                request.portfolio_id,
                quantity,
                price,
            );
            if !order.is_valid() {
                tracing::warn!(
                    %ticker,
                    %date,
                    capital_per_order,
                    fee = request.fixed_fee,
                    "order capital does not cover the brokerage fee; skipping"
                );
                report.skipped.push(SkippedOrder {
                    date,
                    reason: SkipReason::NonPositiveQuantity { quantity },
                });
                continue;
            }

            match orders.submit(&order) {
                Ok(()) => {
                    tracing::info!(
                        id = %order.unique_identifier,
                        quantity = order.quantity,
                        price = order.price,
                        "order submitted"
                    );
                    report.submitted.push(order);
                }
                Err(e) => {
                    tracing::error!(id = %order.unique_identifier, error = %e, "order failed");
                    report.failed.push(FailedOrder {
                        order,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            %ticker,
            submitted = report.submitted_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "ticker done"
        );
        tickers.push(report);
    }

    Ok(ScheduleReport {
        buy_orders,
        dates,
        tickers,
    })
}

struct AcceptAll;

impl OrderSubmission for AcceptAll {
    fn submit(&self, _order: &TradeOrder) -> Result<(), DcaError> {
        Ok(())
    }
}

/// Dry run: the same schedule with every order accepted locally.
///
/// The report's `submitted` lists are the orders a real run would send.
pub fn plan_orders(
    request: &ScheduleRequest,
    scored_rows: &[ScoredSecurity],
    weights: &[f64],
    prices: &dyn PriceLookup,
) -> Result<ScheduleReport, DcaError> {
    schedule_and_submit(request, scored_rows, weights, prices, &AcceptAll)
}
