//! Yahoo Finance adapter.
//!
//! Prices: the daily close for one symbol and one day from the v8 chart API.
//! Fundamentals: the latest market price from the chart metadata, plus
//! dividend yield, payout ratio and sector from `quoteSummary`.
//! One request per lookup, no retries. Exchange suffixes (`.AX` for the ASX)
//! are appended to the ticker before the request.

use crate::domain::error::DcaError;
use crate::ports::fundamentals_port::{Fundamentals, FundamentalsLookup};
use crate::ports::price_port::PriceLookup;
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    gmtoffset: Option<i64>,
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryData {
    summary_detail: Option<SummaryDetail>,
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    dividend_yield: Option<RawValue>,
    payout_ratio: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
}

pub struct YahooPriceAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
    symbol_suffix: String,
}

impl YahooPriceAdapter {
    pub fn new(symbol_suffix: &str) -> Result<Self, DcaError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) valuedca")
            .build()
            .map_err(|e| DcaError::Api {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: YAHOO_BASE_URL.to_string(),
            symbol_suffix: symbol_suffix.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn symbol(&self, ticker: &str) -> String {
        format!("{}{}", ticker.to_uppercase(), self.symbol_suffix)
    }

    /// Chart URL with a day of slack either side of `date`.
    ///
    /// Bars are stamped at the exchange open in UTC, which for the ASX falls
    /// on the previous UTC day.
    fn chart_url(&self, symbol: &str, date: NaiveDate) -> Option<String> {
        let start_ts = date
            .checked_sub_days(Days::new(1))?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
            .timestamp();
        let end_ts = date
            .checked_add_days(Days::new(2))?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
            .timestamp();
        Some(format!(
            "{}/v8/finance/chart/{symbol}?period1={start_ts}&period2={end_ts}&interval=1d",
            self.base_url
        ))
    }

    fn latest_chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{symbol}?range=1d&interval=1d", self.base_url)
    }

    fn summary_url(&self, symbol: &str) -> String {
        format!(
            "{}/v10/finance/quoteSummary/{symbol}?modules=summaryDetail,assetProfile",
            self.base_url
        )
    }

    /// GET and decode a JSON body; `None` on 404.
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, String> {
        tracing::debug!(%url, "yahoo request");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }
        response
            .json()
            .map(Some)
            .map_err(|e| format!("unexpected response: {e}"))
    }

    fn parse_market_price(resp: ChartResponse) -> Option<f64> {
        resp.chart
            .result?
            .into_iter()
            .next()?
            .meta?
            .regular_market_price
    }

    /// Yield (as a percentage), payout ratio and sector from a summary.
    fn parse_summary(resp: SummaryResponse) -> Result<Fundamentals, String> {
        let Some(result) = resp.quote_summary.result else {
            return match resp.quote_summary.error {
                Some(err) => Err(format!("{}: {}", err.code, err.description)),
                None => Ok(Fundamentals::default()),
            };
        };
        let Some(data) = result.into_iter().next() else {
            return Ok(Fundamentals::default());
        };
        let (yield_raw, payout_raw) = match data.summary_detail {
            Some(detail) => (
                detail.dividend_yield.and_then(|v| v.raw),
                detail.payout_ratio.and_then(|v| v.raw),
            ),
            None => (None, None),
        };
        Ok(Fundamentals {
            price: None,
            yield_pct: yield_raw.map(|y| y * 100.0),
            stability: payout_raw,
            sector: data.asset_profile.and_then(|p| p.sector),
        })
    }

    /// Close on `date` from a chart response, `None` when that day has no bar.
    fn parse_close(symbol: &str, date: NaiveDate, resp: ChartResponse) -> Result<Option<f64>, String> {
        let Some(result) = resp.chart.result else {
            return match resp.chart.error {
                Some(err) if err.code == "Not Found" => Ok(None),
                Some(err) => Err(format!("{}: {}", err.code, err.description)),
                None => Err(format!("empty chart result for {symbol}")),
            };
        };
        let Some(data) = result.into_iter().next() else {
            return Ok(None);
        };
        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
        let timestamps = data.timestamp.unwrap_or_default();
        let Some(quote) = data.indicators.quote.into_iter().next() else {
            return Ok(None);
        };

        for (i, &ts) in timestamps.iter().enumerate() {
            let bar_date =
                chrono::DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive());
            if bar_date == Some(date) {
                return Ok(quote.close.get(i).copied().flatten());
            }
        }
        Ok(None)
    }
}

impl PriceLookup for YahooPriceAdapter {
    fn get_price(&self, ticker: &str, date: NaiveDate) -> Result<Option<f64>, DcaError> {
        let symbol = self.symbol(ticker);
        let unavailable = |reason: String| DcaError::PriceUnavailable {
            ticker: ticker.to_string(),
            date,
            reason,
        };

        let url = self
            .chart_url(&symbol, date)
            .ok_or_else(|| unavailable("date out of range".to_string()))?;
        let Some(body) = self.get_json::<ChartResponse>(&url).map_err(unavailable)? else {
            return Ok(None);
        };
        Self::parse_close(&symbol, date, body).map_err(unavailable)
    }
}

impl FundamentalsLookup for YahooPriceAdapter {
    fn get_fields(&self, ticker: &str) -> Result<Fundamentals, DcaError> {
        let symbol = self.symbol(ticker);

        let price = self
            .get_json::<ChartResponse>(&self.latest_chart_url(&symbol))
            .map_err(|reason| DcaError::Api {
                reason: format!("{symbol}: {reason}"),
            })?
            .and_then(Self::parse_market_price);

        let summary = self
            .get_json::<SummaryResponse>(&self.summary_url(&symbol))
            .and_then(|body| body.map(Self::parse_summary).transpose());
        let mut fields = match summary {
            Ok(fields) => fields.unwrap_or_default(),
            Err(reason) => {
                tracing::warn!(%symbol, %reason, "no quote summary; yield and payout left empty");
                Fundamentals::default()
            }
        };
        fields.price = price;
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn parse(json: &str, date: NaiveDate) -> Result<Option<f64>, String> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooPriceAdapter::parse_close("BHP.AX", date, resp)
    }

    #[test]
    fn symbol_gets_suffix() {
        let adapter = YahooPriceAdapter::new(".AX").unwrap();
        assert_eq!(adapter.symbol("bhp"), "BHP.AX");
    }

    #[test]
    fn url_spans_surrounding_days() {
        let adapter = YahooPriceAdapter::new(".AX")
            .unwrap()
            .with_base_url("http://localhost:9000/");
        let url = adapter.chart_url("BHP.AX", d(2024, 1, 2)).unwrap();
        assert_eq!(
            url,
            "http://localhost:9000/v8/finance/chart/BHP.AX?period1=1704067200&period2=1704326400&interval=1d"
        );
        assert_eq!(
            adapter.summary_url("BHP.AX"),
            "http://localhost:9000/v10/finance/quoteSummary/BHP.AX?modules=summaryDetail,assetProfile"
        );
    }

    #[test]
    fn parses_close_for_matching_day() {
        // 2024-01-02T00:00:00Z and 2024-01-03T00:00:00Z
        let json = r#"{"chart":{"result":[{"timestamp":[1704153600,1704240000],
            "indicators":{"quote":[{"close":[45.5,46.0]}]}}],"error":null}}"#;
        assert_eq!(parse(json, d(2024, 1, 3)), Ok(Some(46.0)));
    }

    #[test]
    fn exchange_offset_shifts_bar_date() {
        // 2024-01-01T23:00:00Z is 10:00 on 2024-01-02 in Sydney (+11h).
        let json = r#"{"chart":{"result":[{"meta":{"gmtoffset":39600},
            "timestamp":[1704150000],
            "indicators":{"quote":[{"close":[45.5]}]}}],"error":null}}"#;
        assert_eq!(parse(json, d(2024, 1, 2)), Ok(Some(45.5)));
        assert_eq!(parse(json, d(2024, 1, 1)), Ok(None));
    }

    #[test]
    fn null_close_is_none() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704153600],
            "indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#;
        assert_eq!(parse(json, d(2024, 1, 2)), Ok(None));
    }

    #[test]
    fn no_bar_on_date_is_none() {
        let json = r#"{"chart":{"result":[{"indicators":{"quote":[{"close":[]}]}}],"error":null}}"#;
        assert_eq!(parse(json, d(2024, 1, 6)), Ok(None));
    }

    #[test]
    fn api_error_is_reported() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert_eq!(
            parse(json, d(2024, 1, 2)),
            Err("Bad Request: Invalid input".to_string())
        );
    }

    #[test]
    fn unknown_symbol_is_none() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert_eq!(parse(json, d(2024, 1, 2)), Ok(None));
    }

    #[test]
    fn market_price_from_chart_meta() {
        let json = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":44.87,"gmtoffset":36000},
            "indicators":{"quote":[{}]}}],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        assert_eq!(YahooPriceAdapter::parse_market_price(resp), Some(44.87));
    }

    #[test]
    fn summary_yields_percent_payout_and_sector() {
        let json = r#"{"quoteSummary":{"result":[{
            "summaryDetail":{"dividendYield":{"raw":0.0512,"fmt":"5.12%"},"payoutRatio":{"raw":0.65,"fmt":"65.00%"}},
            "assetProfile":{"sector":"Basic Materials"}}],"error":null}}"#;
        let resp: SummaryResponse = serde_json::from_str(json).unwrap();
        let fields = YahooPriceAdapter::parse_summary(resp).unwrap();
        assert!((fields.yield_pct.unwrap() - 5.12).abs() < 1e-9);
        assert_eq!(fields.stability, Some(0.65));
        assert_eq!(fields.sector.as_deref(), Some("Basic Materials"));
        assert_eq!(fields.price, None);
    }

    #[test]
    fn summary_without_dividend_is_empty() {
        let json = r#"{"quoteSummary":{"result":[{"summaryDetail":{"dividendYield":{}}}],"error":null}}"#;
        let resp: SummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(YahooPriceAdapter::parse_summary(resp), Ok(Fundamentals::default()));
    }

    #[test]
    fn summary_error_is_reported() {
        let json = r#"{"quoteSummary":{"result":null,"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#;
        let resp: SummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            YahooPriceAdapter::parse_summary(resp),
            Err("Unauthorized: Invalid Crumb".to_string())
        );
    }
}
