//! Yahoo Finance Chart Source
//!
//! Daily close history for equities and REITs via `/v8/finance/chart/{symbol}`.
//! One request per symbol; a symbol the provider has nothing for comes back
//! as an empty series so the rest of the batch still ranks.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::SourceAdapter;
use crate::error::{RankerError, Result};
use crate::model::{AssetClass, PricePoint, RawQuote};

/// Yahoo chart client configuration
#[derive(Clone, Debug)]
pub struct YahooConfig {
    /// Chart endpoint, symbol is appended as the last path segment
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com/v8/finance/chart".into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Close-price history source for one asset class
pub struct YahooChartSource {
    client: Client,
    base: Url,
    asset_class: AssetClass,
    name: String,
}

impl YahooChartSource {
    pub fn new(asset_class: AssetClass, config: YahooConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| RankerError::Config(format!("invalid chart url {}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(RankerError::Config(format!("chart url cannot be a base: {base}")));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("asset-ranker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base,
            asset_class,
            name: format!("yahoo-{asset_class}"),
        })
    }

    fn chart_url(&self, symbol: &str, window_days: u32) -> Result<Url> {
        let end = Utc::now();
        let start = chrono::Duration::try_days(i64::from(window_days))
            .and_then(|window| end.checked_sub_signed(window))
            .ok_or_else(|| {
                RankerError::Config(format!("window of {window_days} days is out of range"))
            })?;

        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(symbol);
        }
        url.query_pairs_mut()
            .append_pair("period1", &start.timestamp().to_string())
            .append_pair("period2", &end.timestamp().to_string())
            .append_pair("interval", "1d");
        Ok(url)
    }

    /// Fetch one symbol. `Err` means the provider itself failed.
    async fn fetch_symbol(&self, symbol: &str, window_days: u32) -> Result<RawQuote> {
        let url = self.chart_url(symbol, window_days)?;

        let resp = self
            .client
            .get(url)
            .header("accept", "application/json")
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(source = %self.name, symbol, "unknown symbol");
                return Ok(RawQuote::empty_series(symbol));
            }
            status if !status.is_success() => {
                return Err(RankerError::unavailable(
                    &self.name,
                    format!("{symbol}: HTTP {status}"),
                ));
            }
            _ => {}
        }

        let body = resp.bytes().await?;
        parse_chart(symbol, &body)
    }
}

#[async_trait]
impl SourceAdapter for YahooChartSource {
    async fn fetch(&self, symbols: &[String], window_days: u32) -> Result<Vec<RawQuote>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(symbols.iter().map(|s| self.fetch_symbol(s, window_days))).await;
        collect_symbol_results(&self.name, symbols, results)
    }

    fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fold per-symbol outcomes into one batch.
///
/// A failed symbol becomes an empty series so the rest still rank. Only when
/// no symbol produced any observation and at least one request failed is the
/// whole source reported unavailable.
fn collect_symbol_results(
    source_name: &str,
    symbols: &[String],
    results: Vec<Result<RawQuote>>,
) -> Result<Vec<RawQuote>> {
    let mut quotes = Vec::with_capacity(symbols.len());
    let mut last_error = None;
    for (symbol, result) in symbols.iter().zip(results) {
        match result {
            Ok(quote) => quotes.push(quote),
            Err(e) => {
                tracing::warn!(source = %source_name, %symbol, "symbol fetch failed: {}", e);
                quotes.push(RawQuote::empty_series(symbol.clone()));
                last_error = Some(e);
            }
        }
    }

    let no_data = quotes
        .iter()
        .all(|q| matches!(q, RawQuote::Series { points, .. } if points.is_empty()));
    match last_error {
        Some(e) if no_data => Err(RankerError::unavailable(source_name, e.to_string())),
        _ => Ok(quotes),
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<Decimal>>,
}

/// Parse a chart response body into a close-price series.
///
/// Null or non-positive closes are skipped. A provider-side "no data" error
/// yields an empty series; an unparseable body is a source failure.
fn parse_chart(symbol: &str, body: &[u8]) -> Result<RawQuote> {
    let envelope: ChartEnvelope = serde_json::from_slice(body)?;

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        if let Some(err) = envelope.chart.error {
            tracing::debug!(
                symbol,
                code = %err.code,
                "chart error: {}",
                err.description.unwrap_or_default()
            );
        }
        return Ok(RawQuote::empty_series(symbol));
    };

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let points = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let price = close.filter(|p| *p > Decimal::ZERO)?;
            let at = DateTime::<Utc>::from_timestamp(*ts, 0)?;
            Some(PricePoint::new(at, price))
        })
        .collect();

    Ok(RawQuote::Series {
        symbol: result.meta.symbol.unwrap_or_else(|| symbol.to_string()),
        display_name: result.meta.long_name.or(result.meta.short_name),
        points,
    })
}
