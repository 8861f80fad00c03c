//! CoinGecko Markets Source
//!
//! A single ranked listing from `/coins/markets`, already carrying the
//! provider's own trailing return for each coin.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::SourceAdapter;
use crate::error::{RankerError, Result};
use crate::model::{AssetClass, RawQuote};

/// CoinGecko client configuration
#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    pub base_url: String,

    /// Reporting currency (`vs_currency`)
    pub vs_currency: String,

    /// Listing sort order, e.g. `market_cap_desc`
    pub order: String,

    pub per_page: u32,

    pub page: u32,

    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3/coins/markets".into(),
            vs_currency: "brl".into(),
            order: "market_cap_desc".into(),
            per_page: 250,
            page: 1,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Trailing windows the provider reports, in days
const PROVIDER_WINDOWS: &[(u32, &str)] = &[
    (1, "24h"),
    (7, "7d"),
    (14, "14d"),
    (30, "30d"),
    (200, "200d"),
    (365, "1y"),
];

/// Provider window closest to `window_days`, as `(days, name)`. Ties go to
/// the shorter window.
pub fn provider_window(window_days: u32) -> (u32, &'static str) {
    PROVIDER_WINDOWS
        .iter()
        .copied()
        .min_by_key(|(days, _)| days.abs_diff(window_days))
        .unwrap_or((30, "30d"))
}

/// Snapshot source for the crypto class
pub struct CoinGeckoSource {
    client: Client,
    base: Url,
    config: CoinGeckoConfig,
    name: String,
}

impl CoinGeckoSource {
    pub fn new(config: CoinGeckoConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| RankerError::Config(format!("invalid markets url {}: {e}", config.base_url)))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("asset-ranker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base,
            config,
            name: "coingecko".into(),
        })
    }

    fn markets_url(&self, window: &str) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("vs_currency", &self.config.vs_currency)
            .append_pair("order", &self.config.order)
            .append_pair("per_page", &self.config.per_page.to_string())
            .append_pair("page", &self.config.page.to_string())
            .append_pair("sparkline", "false")
            .append_pair("price_change_percentage", window);
        url
    }

    async fn fetch_listing(&self, window: &str) -> Result<Vec<RawQuote>> {
        let resp = self
            .client
            .get(self.markets_url(window))
            .header("accept", "application/json")
            .send()
            .await?
            .error_for_status()?;

        let body = resp.bytes().await?;
        parse_markets(&body, window)
    }
}

#[async_trait]
impl SourceAdapter for CoinGeckoSource {
    async fn fetch(&self, symbols: &[String], window_days: u32) -> Result<Vec<RawQuote>> {
        let (_, window) = provider_window(window_days);

        let listing = self
            .fetch_listing(window)
            .await
            .map_err(|e| RankerError::unavailable(&self.name, e.to_string()))?;

        tracing::debug!(source = %self.name, window, coins = listing.len(), "markets listing fetched");

        if symbols.is_empty() {
            return Ok(listing);
        }

        Ok(listing
            .into_iter()
            .filter(|q| {
                q.symbol()
                    .is_some_and(|s| symbols.iter().any(|wanted| wanted.eq_ignore_ascii_case(s)))
            })
            .collect())
    }

    fn asset_class(&self) -> AssetClass {
        AssetClass::Crypto
    }

    fn effective_window_days(&self, window_days: u32) -> u32 {
        provider_window(window_days).0
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoinMarket {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    current_price: Option<Decimal>,
    #[serde(default)]
    market_cap: Option<Decimal>,
    /// Holds the `price_change_percentage_<window>_in_currency` fields
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

fn parse_markets(body: &[u8], window: &str) -> Result<Vec<RawQuote>> {
    let coins: Vec<CoinMarket> = serde_json::from_slice(body)?;
    let change_key = format!("price_change_percentage_{window}_in_currency");

    Ok(coins
        .into_iter()
        .map(|coin| {
            let trailing_return_pct = coin
                .extra
                .get(&change_key)
                .and_then(|v| serde_json::from_value::<Decimal>(v.clone()).ok());

            RawQuote::Snapshot {
                symbol: coin.symbol,
                name: coin.name,
                current_price: coin.current_price,
                trailing_return_pct,
                market_size: coin.market_cap,
            }
        })
        .collect())
}
