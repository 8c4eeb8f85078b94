//! Sharesight brokerage ledger adapter.
//!
//! [`SharesightClient`] is the authenticated context: it owns the HTTP client
//! and the bearer token, and every API call goes through it. Portfolio reads
//! use the latest API version; creating/deleting portfolios and posting
//! trades use the legacy version.

pub mod auth;

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::domain::error::DcaError;
use crate::domain::order::TradeOrder;
use crate::ports::config_port::ConfigPort;
use crate::ports::order_port::OrderSubmission;
use crate::ports::portfolio_port::{Holding, PortfolioDirectory, PortfolioSummary};

pub const DEFAULT_API_BASE_URL: &str = "https://api.sharesight.com/api/";
pub const DEFAULT_TOKEN_URL: &str = "https://api.sharesight.com/oauth2/token";
pub const DEFAULT_LATEST_VERSION: &str = "v3";
pub const DEFAULT_LEGACY_VERSION: &str = "v2";

#[derive(Debug, Clone, PartialEq)]
pub struct SharesightConfig {
    pub api_base_url: String,
    pub token_url: String,
    pub latest_version: String,
    pub legacy_version: String,
    pub client_id: String,
    pub client_secret: String,
}

impl SharesightConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DcaError> {
        let secret = |key: &str, env_var: &str| {
            config
                .get_string_or_env("sharesight", key, env_var)
                .ok_or_else(|| DcaError::ConfigMissing {
                    section: "sharesight".to_string(),
                    key: key.to_string(),
                })
        };
        let setting = |key: &str, env_var: &str, default: &str| {
            config
                .get_string_or_env("sharesight", key, env_var)
                .unwrap_or_else(|| default.to_string())
        };

        Ok(SharesightConfig {
            api_base_url: setting("api_base_url", "SHARESIGHT_API_BASE_URL", DEFAULT_API_BASE_URL),
            token_url: setting("token_url", "SHARESIGHT_ACCESS_TOKEN_URL", DEFAULT_TOKEN_URL),
            latest_version: setting(
                "latest_version",
                "SHARESIGHT_API_LATEST_VERSION",
                DEFAULT_LATEST_VERSION,
            ),
            legacy_version: setting(
                "legacy_version",
                "SHARESIGHT_API_LEGACY_VERSION",
                DEFAULT_LEGACY_VERSION,
            ),
            client_id: secret("client_id", "SHARESIGHT_CLIENT_ID")?,
            client_secret: secret("client_secret", "SHARESIGHT_CLIENT_SECRET")?,
        })
    }

    fn endpoint(&self, version: &str, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_base_url.trim_end_matches('/'),
            version.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn latest_url(&self, path: &str) -> String {
        self.endpoint(&self.latest_version, path)
    }

    pub fn legacy_url(&self, path: &str) -> String {
        self.endpoint(&self.legacy_version, path)
    }
}

#[derive(Debug, Deserialize)]
struct PortfoliosResponse {
    portfolios: Vec<PortfolioRecord>,
}

#[derive(Debug, Deserialize)]
struct PortfolioRecord {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct HoldingsResponse {
    holdings: Vec<HoldingRecord>,
}

#[derive(Debug, Deserialize)]
struct HoldingRecord {
    id: i64,
    instrument: InstrumentRecord,
}

#[derive(Debug, Deserialize)]
struct InstrumentRecord {
    code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    market_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct TradePayload<'a> {
    unique_identifier: &'a str,
    transaction_type: &'a str,
    transaction_date: String,
    portfolio_id: i64,
    symbol: &'a str,
    market: &'a str,
    quantity: f64,
    price: f64,
    exchange_rate: f64,
}

#[derive(Debug, Serialize)]
struct TradeEnvelope<'a> {
    trade: TradePayload<'a>,
}

impl<'a> From<&'a TradeOrder> for TradeEnvelope<'a> {
    fn from(order: &'a TradeOrder) -> Self {
        TradeEnvelope {
            trade: TradePayload {
                unique_identifier: &order.unique_identifier,
                transaction_type: order.transaction_type.as_str(),
                transaction_date: order.transaction_date.format("%Y-%m-%d").to_string(),
                portfolio_id: order.portfolio_id,
                symbol: &order.ticker,
                market: &order.market,
                quantity: order.quantity,
                price: order.price,
                exchange_rate: order.exchange_rate,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePortfolio<'a> {
    name: &'a str,
}

pub struct SharesightClient {
    http: Client,
    config: SharesightConfig,
    token: String,
}

impl SharesightClient {
    fn http_client() -> Result<Client, DcaError> {
        Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DcaError::Api {
                reason: format!("failed to build HTTP client: {e}"),
            })
    }

    /// Exchange the client credentials for a token and return a ready client.
    pub fn connect(config: SharesightConfig) -> Result<Self, DcaError> {
        let http = Self::http_client()?;
        let token = auth::request_access_token(
            &http,
            &config.token_url,
            &config.client_id,
            &config.client_secret,
        )?;
        tracing::info!("authenticated with Sharesight");
        Ok(Self {
            http,
            config,
            token,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, DcaError> {
        let response = self
            .authorized(builder)
            .send()
            .map_err(|e| DcaError::Api {
                reason: format!("{what}: {e}"),
            })?;
        check_status(response, what)
    }
}

fn check_status(response: Response, what: &str) -> Result<Response, DcaError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(DcaError::Api {
        reason: format!("{what}: HTTP {} {}", status.as_u16(), body.trim()),
    })
}

impl PortfolioDirectory for SharesightClient {
    fn list_portfolios(&self) -> Result<Vec<PortfolioSummary>, DcaError> {
        let url = self.config.latest_url("portfolios");
        let response = self.send(self.http.get(&url), "error fetching portfolios")?;
        let body: PortfoliosResponse = response.json().map_err(|e| DcaError::Api {
            reason: format!("unexpected portfolios response: {e}"),
        })?;
        Ok(body
            .portfolios
            .into_iter()
            .map(|p| PortfolioSummary {
                id: p.id,
                name: p.name,
            })
            .collect())
    }

    fn list_holdings(&self, portfolio_id: i64) -> Result<Vec<Holding>, DcaError> {
        let url = self
            .config
            .latest_url(&format!("portfolios/{portfolio_id}/holdings"));
        let response = self.send(self.http.get(&url), "error fetching holdings")?;
        let body: HoldingsResponse = response.json().map_err(|e| DcaError::Api {
            reason: format!("unexpected holdings response: {e}"),
        })?;
        Ok(body.holdings.into_iter().map(Holding::from).collect())
    }

    fn create_portfolio(&self, name: &str) -> Result<(), DcaError> {
        let url = self.config.legacy_url("portfolios");
        self.send(
            self.http.post(&url).json(&CreatePortfolio { name }),
            "error creating portfolio",
        )?;
        tracing::info!(%name, "portfolio created");
        Ok(())
    }

    fn delete_portfolio(&self, portfolio_id: i64) -> Result<(), DcaError> {
        let url = self.config.legacy_url(&format!("portfolios/{portfolio_id}"));
        self.send(self.http.delete(&url), "error deleting portfolio")?;
        tracing::info!(portfolio_id, "portfolio deleted");
        Ok(())
    }
}

impl From<HoldingRecord> for Holding {
    fn from(record: HoldingRecord) -> Self {
        Holding {
            id: record.id,
            code: record.instrument.code,
            name: record.instrument.name,
            market: record.instrument.market_code.unwrap_or_default(),
        }
    }
}

impl OrderSubmission for SharesightClient {
    fn submit(&self, order: &TradeOrder) -> Result<(), DcaError> {
        let url = self.config.legacy_url("trades.json");
        let payload = TradeEnvelope::from(order);
        self.send(self.http.post(&url).json(&payload), "error pushing trade")
            .map(|_| ())
            .map_err(|e| DcaError::Submission {
                identifier: order.unique_identifier.clone(),
                reason: match e {
                    DcaError::Api { reason } => reason,
                    other => other.to_string(),
                },
            })
    }
}
