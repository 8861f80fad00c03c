//! Pipeline Configuration
//!
//! Defaults mirror the Brazilian dashboard: five B3 stocks, five FIIs and the
//! mid-cap altcoin band, all reported in BRL.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RankerError, Result};
use crate::normalize::MarketSizeBand;
use crate::ranking::DEFAULT_TOP_N;

pub const DEFAULT_WINDOW_DAYS: u32 = 90;

/// Longest lookback accepted, one hundred years
pub const MAX_WINDOW_DAYS: u32 = 36_500;

const DEFAULT_EQUITIES: &[&str] = &["PETR4.SA", "VALE3.SA", "ITUB4.SA", "BBAS3.SA", "ABEV3.SA"];
const DEFAULT_REITS: &[&str] = &["MXRF11.SA", "KNRI11.SA", "HGLG11.SA", "BCFF11.SA", "VISC11.SA"];

/// Everything one ranking run depends on
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Lookback window for returns
    pub window_days: u32,

    /// Entries kept per asset class
    pub top_n: usize,

    /// Reporting currency for the snapshot provider
    pub vs_currency: String,

    pub equity_symbols: Vec<String>,

    pub reit_symbols: Vec<String>,

    /// Empty means the whole provider listing
    pub crypto_symbols: Vec<String>,

    /// Crypto market-cap filter; `None` disables it
    pub market_band: Option<MarketSizeBand>,

    /// Upper bound on one source fetch
    pub source_timeout: Duration,

    /// How long a successful fetch is reused; zero disables memoization
    pub memo_ttl: Duration,

    pub crypto_page_size: u32,

    pub crypto_order: String,

    /// Local JSON dataset consulted when a live source is down
    pub fallback_path: Option<PathBuf>,

    pub yahoo_base_url: String,

    pub coingecko_base_url: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            top_n: DEFAULT_TOP_N,
            vs_currency: "brl".into(),
            equity_symbols: DEFAULT_EQUITIES.iter().map(|s| (*s).to_string()).collect(),
            reit_symbols: DEFAULT_REITS.iter().map(|s| (*s).to_string()).collect(),
            crypto_symbols: Vec::new(),
            market_band: Some(MarketSizeBand::default()),
            source_timeout: Duration::from_secs(10),
            memo_ttl: Duration::from_secs(60),
            crypto_page_size: 250,
            crypto_order: "market_cap_desc".into(),
            fallback_path: None,
            yahoo_base_url: "https://query1.finance.yahoo.com/v8/finance/chart".into(),
            coingecko_base_url: "https://api.coingecko.com/api/v3/coins/markets".into(),
        }
    }
}

impl PipelineConfig {
    /// Read `RANKER_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Absent or unparseable values keep
    /// their default; the result is validated.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let market_band = match get("RANKER_MARKET_BAND").as_deref() {
            Some("off" | "none" | "false" | "0") => None,
            _ => {
                let band = defaults.market_band.unwrap_or_default();
                let min = parse_or(get("RANKER_MARKET_CAP_MIN"), band.min, "RANKER_MARKET_CAP_MIN");
                let max = parse_or(get("RANKER_MARKET_CAP_MAX"), band.max, "RANKER_MARKET_CAP_MAX");
                Some(MarketSizeBand::new(min, max)?)
            }
        };

        let config = Self {
            window_days: parse_or(get("RANKER_WINDOW_DAYS"), defaults.window_days, "RANKER_WINDOW_DAYS"),
            top_n: parse_or(get("RANKER_TOP_N"), defaults.top_n, "RANKER_TOP_N"),
            vs_currency: get("RANKER_VS_CURRENCY")
                .map_or(defaults.vs_currency, |c| c.to_lowercase()),
            equity_symbols: get("RANKER_EQUITIES").map_or(defaults.equity_symbols, |v| split_symbols(&v)),
            reit_symbols: get("RANKER_REITS").map_or(defaults.reit_symbols, |v| split_symbols(&v)),
            crypto_symbols: get("RANKER_CRYPTOS").map_or(defaults.crypto_symbols, |v| split_symbols(&v)),
            market_band,
            source_timeout: Duration::from_secs(parse_or(
                get("RANKER_SOURCE_TIMEOUT_SECS"),
                defaults.source_timeout.as_secs(),
                "RANKER_SOURCE_TIMEOUT_SECS",
            )),
            memo_ttl: Duration::from_secs(parse_or(
                get("RANKER_MEMO_TTL_SECS"),
                defaults.memo_ttl.as_secs(),
                "RANKER_MEMO_TTL_SECS",
            )),
            crypto_page_size: parse_or(
                get("RANKER_CRYPTO_PAGE_SIZE"),
                defaults.crypto_page_size,
                "RANKER_CRYPTO_PAGE_SIZE",
            ),
            crypto_order: get("RANKER_CRYPTO_ORDER").unwrap_or(defaults.crypto_order),
            fallback_path: get("RANKER_FALLBACK_PATH").map(PathBuf::from),
            yahoo_base_url: get("RANKER_YAHOO_URL").unwrap_or(defaults.yahoo_base_url),
            coingecko_base_url: get("RANKER_COINGECKO_URL").unwrap_or(defaults.coingecko_base_url),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(RankerError::Config(format!(
                "window_days must be within 1..={MAX_WINDOW_DAYS}"
            )));
        }
        if self.top_n == 0 {
            return Err(RankerError::Config("top_n must be at least 1".into()));
        }
        if self.source_timeout.is_zero() {
            return Err(RankerError::Config("source timeout must be positive".into()));
        }
        if self.crypto_page_size == 0 || self.crypto_page_size > 250 {
            return Err(RankerError::Config("crypto page size must be within 1..=250".into()));
        }
        if let Some(band) = &self.market_band {
            MarketSizeBand::new(band.min, band.max)?;
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T, key: &str) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparseable setting, using default");
            default
        }),
        None => default,
    }
}

fn split_symbols(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
