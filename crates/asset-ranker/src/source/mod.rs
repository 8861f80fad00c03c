//! Market Data Sources
//!
//! One adapter per provider, all behind the [`SourceAdapter`] trait.

mod coingecko;
mod fallback;
mod fixture;
mod memo;
mod yahoo;

pub use coingecko::{CoinGeckoConfig, CoinGeckoSource};
pub use fallback::FallbackSource;
pub use fixture::FixtureSource;
pub use memo::MemoizedSource;
pub use yahoo::{YahooChartSource, YahooConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AssetClass, RawQuote};

/// Market data source (Strategy pattern)
///
/// Implement this for each provider. A failed upstream call must surface as
/// `RankerError::SourceUnavailable`; per-symbol gaps are returned as empty
/// series instead of failing the batch.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch raw quotes for `symbols` over the last `window_days` days
    async fn fetch(&self, symbols: &[String], window_days: u32) -> Result<Vec<RawQuote>>;

    /// Asset class this source feeds
    fn asset_class(&self) -> AssetClass;

    /// Lookback actually covered when asked for `window_days`. Providers
    /// with fixed windows report the one they use.
    fn effective_window_days(&self, window_days: u32) -> u32 {
        window_days
    }

    /// Source name, used in logs and error reports
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: SourceAdapter + ?Sized> SourceAdapter for std::sync::Arc<T> {
    async fn fetch(&self, symbols: &[String], window_days: u32) -> Result<Vec<RawQuote>> {
        (**self).fetch(symbols, window_days).await
    }

    fn asset_class(&self) -> AssetClass {
        (**self).asset_class()
    }

    fn effective_window_days(&self, window_days: u32) -> u32 {
        (**self).effective_window_days(window_days)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
