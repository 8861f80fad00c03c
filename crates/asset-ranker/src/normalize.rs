//! Asset Normalization
//!
//! Maps provider payloads onto the common `AssetQuote` schema. Pure mapping,
//! no I/O. Records that cannot be resolved are rejected with a recoverable
//! error and dropped by [`normalize_batch`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{RankerError, Result};
use crate::model::{AssetClass, AssetQuote, PricePoint, RawQuote};
use crate::returns::compute_return;

/// Admissible market-capitalization band, bounds exclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSizeBand {
    pub min: Decimal,
    pub max: Decimal,
}

impl Default for MarketSizeBand {
    /// Mid-cap band: excludes micro-cap noise and mega-caps
    fn default() -> Self {
        Self {
            min: dec!(1_000_000_000),
            max: dec!(30_000_000_000),
        }
    }
}

impl MarketSizeBand {
    pub fn new(min: Decimal, max: Decimal) -> Result<Self> {
        if min >= max {
            return Err(RankerError::Config(format!(
                "market band minimum {min} must be below maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, market_size: Decimal) -> bool {
        self.min < market_size && market_size < self.max
    }
}

/// Normalize one raw record.
///
/// `band` only applies to the crypto class; a crypto record without a market
/// size is rejected while the filter is active.
pub fn normalize(
    raw: RawQuote,
    asset_class: AssetClass,
    band: Option<&MarketSizeBand>,
) -> Result<AssetQuote> {
    let quote = match raw {
        RawQuote::Series { symbol, display_name, points } => {
            normalize_series(symbol, display_name, points, asset_class)?
        }
        RawQuote::Snapshot {
            symbol,
            name,
            current_price,
            trailing_return_pct,
            market_size,
        } => {
            let symbol = resolve_symbol(symbol.as_deref(), asset_class)?;
            let price = current_price
                .ok_or_else(|| RankerError::unresolvable(&symbol, "missing current price"))?;

            let mut quote = AssetQuote::new(symbol, asset_class).with_price(price);
            if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                quote.display_name = name.trim().to_string();
            }
            quote.window_return_pct = trailing_return_pct;
            quote.market_size = market_size;
            quote
        }
    };

    if asset_class == AssetClass::Crypto {
        if let Some(band) = band {
            match quote.market_size {
                Some(size) if band.contains(size) => {}
                _ => return Err(RankerError::OutsideMarketBand { symbol: quote.symbol }),
            }
        }
    }

    Ok(quote)
}

fn normalize_series(
    symbol: String,
    display_name: Option<String>,
    mut points: Vec<PricePoint>,
    asset_class: AssetClass,
) -> Result<AssetQuote> {
    let symbol = resolve_symbol(Some(&symbol), asset_class)?;

    // Stable, so same-timestamp observations keep provider order
    points.sort_by_key(|p| p.at);

    let price = points
        .last()
        .map(|p| p.price)
        .ok_or_else(|| RankerError::unresolvable(&symbol, "no price observations"))?;

    let window_return = compute_return(&points);
    if window_return.is_none() {
        tracing::debug!("{}", RankerError::InsufficientHistory(symbol.clone()));
    }

    let mut quote = AssetQuote::new(symbol, asset_class).with_price(price);
    if let Some(name) = display_name.filter(|n| !n.trim().is_empty()) {
        quote.display_name = name.trim().to_string();
    }
    quote.window_return_pct = window_return;
    Ok(quote)
}

fn resolve_symbol(symbol: Option<&str>, asset_class: AssetClass) -> Result<String> {
    let symbol = symbol
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RankerError::unresolvable("<unknown>", "missing symbol"))?;

    Ok(match asset_class {
        AssetClass::Crypto => symbol.to_uppercase(),
        AssetClass::Equity | AssetClass::Reit => symbol.to_string(),
    })
}

/// Normalize a whole fetch, dropping (and logging) every rejected record
pub fn normalize_batch(
    raws: Vec<RawQuote>,
    asset_class: AssetClass,
    band: Option<&MarketSizeBand>,
) -> Vec<AssetQuote> {
    let total = raws.len();
    let quotes: Vec<AssetQuote> = raws
        .into_iter()
        .filter_map(|raw| match normalize(raw, asset_class, band) {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::debug!(%asset_class, "dropping record: {}", e);
                None
            }
        })
        .collect();

    if quotes.len() < total {
        tracing::debug!(
            %asset_class,
            kept = quotes.len(),
            dropped = total - quotes.len(),
            "normalization finished"
        );
    }

    quotes
}
