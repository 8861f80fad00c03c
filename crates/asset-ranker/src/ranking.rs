//! Ranking Engine
//!
//! Filters unrankable quotes, sorts by window return (descending) and keeps
//! the top N. Always scoped to a single asset class.

use std::collections::HashSet;

use crate::model::{AssetClass, AssetQuote, RankingResult};

/// Default number of entries kept per class
pub const DEFAULT_TOP_N: usize = 5;

/// Rank the quotes of one asset class.
///
/// Quotes without a window return are dropped, as are quotes tagged with a
/// different class and repeated symbols (first occurrence wins). The sort is
/// stable, so equal returns keep their input order. Returns at most `top_n`
/// entries and never pads.
pub fn rank(asset_class: AssetClass, quotes: Vec<AssetQuote>, top_n: usize) -> RankingResult {
    let mut seen = HashSet::new();
    let mut ranked: Vec<AssetQuote> = quotes
        .into_iter()
        .filter(|q| {
            if q.asset_class != asset_class {
                tracing::warn!(
                    symbol = %q.symbol,
                    expected = %asset_class,
                    found = %q.asset_class,
                    "quote from another asset class excluded from ranking"
                );
                return false;
            }
            q.window_return_pct.is_some()
        })
        .filter(|q| seen.insert(q.symbol.clone()))
        .collect();

    // Vec::sort_by is stable
    ranked.sort_by(|a, b| b.window_return_pct.cmp(&a.window_return_pct));
    ranked.truncate(top_n);

    RankingResult::from_ranked(asset_class, ranked)
}

/// Ranking settings for one pipeline run
#[derive(Clone, Copy, Debug)]
pub struct RankingEngine {
    top_n: usize,
}

impl Default for RankingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl RankingEngine {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn rank(&self, asset_class: AssetClass, quotes: Vec<AssetQuote>) -> RankingResult {
        rank(asset_class, quotes, self.top_n)
    }
}
