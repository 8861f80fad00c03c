//! Domain Models
//!
//! Core data types shared by the adapters, the normalizer and the ranking engine.
//! Uses `rust_decimal` for all prices and returns - never use f64 for money!

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{RankerError, Result};

/// Asset class partition; rankings never mix classes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Equity,
    Reit,
    Crypto,
}

impl AssetClass {
    pub const ALL: [Self; 3] = [Self::Equity, Self::Reit, Self::Crypto];

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Self::Equity => "Equities",
            Self::Reit => "REITs",
            Self::Crypto => "Crypto",
        }
    }

    /// Names a user may call this class by
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Equity => &["equity", "equities", "stock", "stocks"],
            Self::Reit => &["reit", "reits", "fii", "fiis"],
            Self::Crypto => &["crypto", "cryptocurrency", "altcoin", "altcoins", "coin", "coins"],
        }
    }

    /// Stable lowercase identifier used in URLs, env vars and CSV rows
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equity => "equity",
            Self::Reit => "reit",
            Self::Crypto => "crypto",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = RankerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|class| class.aliases().contains(&wanted.as_str()))
            .ok_or_else(|| RankerError::Config(format!("unknown asset class: {wanted}")))
    }
}

/// One observation in a close-price series
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub at: DateTime<Utc>,
    pub price: Decimal,
}

impl PricePoint {
    pub fn new(at: DateTime<Utc>, price: Decimal) -> Self {
        Self { at, price }
    }
}

/// Provider-specific payload, discarded right after normalization
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawQuote {
    /// Close-price history for one symbol (equities, REITs)
    Series {
        symbol: String,
        #[serde(default)]
        display_name: Option<String>,
        #[serde(default)]
        points: Vec<PricePoint>,
    },

    /// Pre-aggregated market listing entry (crypto)
    Snapshot {
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        current_price: Option<Decimal>,
        #[serde(default)]
        trailing_return_pct: Option<Decimal>,
        #[serde(default)]
        market_size: Option<Decimal>,
    },
}

impl RawQuote {
    /// Empty series, returned for symbols the provider had nothing for
    pub fn empty_series(symbol: impl Into<String>) -> Self {
        Self::Series {
            symbol: symbol.into(),
            display_name: None,
            points: Vec::new(),
        }
    }

    /// Symbol as reported by the provider, if any
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Series { symbol, .. } => Some(symbol.as_str()),
            Self::Snapshot { symbol, .. } => symbol.as_deref(),
        }
    }
}

/// Normalized, class-comparable quote
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetQuote {
    /// Ticker symbol, unique within one class per ranking run
    pub symbol: String,

    pub display_name: String,

    pub asset_class: AssetClass,

    /// Latest price in the reporting currency
    pub current_price: Option<Decimal>,

    /// Percentage change over the lookback window; `None` means unrankable
    pub window_return_pct: Option<Decimal>,

    /// Market capitalization, when the provider reports one
    pub market_size: Option<Decimal>,
}

impl AssetQuote {
    pub fn new(symbol: impl Into<String>, asset_class: AssetClass) -> Self {
        let symbol = symbol.into();
        Self {
            display_name: symbol.clone(),
            symbol,
            asset_class,
            current_price: None,
            window_return_pct: None,
            market_size: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.current_price = Some(price);
        self
    }

    pub fn with_return(mut self, return_pct: Decimal) -> Self {
        self.window_return_pct = Some(return_pct);
        self
    }
}

/// Ranked quotes for one asset class, best return first
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    pub asset_class: AssetClass,
    entries: Vec<AssetQuote>,
}

impl RankingResult {
    pub(crate) fn from_ranked(asset_class: AssetClass, entries: Vec<AssetQuote>) -> Self {
        Self { asset_class, entries }
    }

    /// A well-formed result with no entries
    pub fn empty(asset_class: AssetClass) -> Self {
        Self {
            asset_class,
            entries: Vec::new(),
        }
    }

    /// Highest-return entry, or `EmptyRanking` when nothing was ranked
    pub fn top(&self) -> Result<&AssetQuote> {
        self.entries
            .first()
            .ok_or(RankerError::EmptyRanking(self.asset_class))
    }

    pub fn entries(&self) -> &[AssetQuote] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetQuote> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
