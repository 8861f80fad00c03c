//! Fixture Source
//!
//! Serves a fixed set of raw quotes. Used as the local fallback dataset and
//! in tests; can also be told to fail like a dead upstream.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use super::SourceAdapter;
use crate::error::{RankerError, Result};
use crate::model::{AssetClass, RawQuote};

/// Static source with canned quotes
pub struct FixtureSource {
    asset_class: AssetClass,
    quotes: Vec<RawQuote>,
    name: String,
    fail_with: Option<String>,
}

impl FixtureSource {
    pub fn new(asset_class: AssetClass, quotes: Vec<RawQuote>) -> Self {
        Self {
            asset_class,
            quotes,
            name: format!("fixture-{asset_class}"),
            fail_with: None,
        }
    }

    /// A source whose every fetch fails with `SourceUnavailable`
    pub fn unavailable(asset_class: AssetClass, reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::new(asset_class, Vec::new())
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Load one class from a JSON dataset shaped as
    /// `{"equity": [RawQuote..], "reit": [..], "crypto": [..]}`
    pub fn from_json(asset_class: AssetClass, json: &str) -> Result<Self> {
        let mut dataset: HashMap<String, Vec<RawQuote>> = serde_json::from_str(json)?;
        let quotes = dataset.remove(asset_class.as_str()).unwrap_or_default();
        Ok(Self::new(asset_class, quotes).with_name(format!("local-{asset_class}")))
    }

    pub fn from_file(asset_class: AssetClass, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RankerError::Config(format!("cannot read dataset {}: {e}", path.display()))
        })?;
        Self::from_json(asset_class, &json)
    }
}

#[async_trait]
impl SourceAdapter for FixtureSource {
    async fn fetch(&self, symbols: &[String], _window_days: u32) -> Result<Vec<RawQuote>> {
        if let Some(reason) = &self.fail_with {
            return Err(RankerError::unavailable(&self.name, reason));
        }

        if symbols.is_empty() {
            return Ok(self.quotes.clone());
        }

        // Keep the requested order; unknown symbols come back empty
        let quotes = symbols
            .iter()
            .map(|wanted| {
                self.quotes
                    .iter()
                    .find(|q| q.symbol().is_some_and(|s| s.eq_ignore_ascii_case(wanted)))
                    .cloned()
                    .unwrap_or_else(|| RawQuote::empty_series(wanted.clone()))
            })
            .collect();
        Ok(quotes)
    }

    fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATASET: &str = r#"{
        "equity": [
            {"kind": "series", "symbol": "PETR4.SA", "points": [
                {"at": "2025-01-02T00:00:00Z", "price": "36.10"},
                {"at": "2025-03-31T00:00:00Z", "price": "38.00"}
            ]}
        ],
        "crypto": [
            {"kind": "snapshot", "symbol": "inj", "name": "Injective", "current_price": 21.4,
             "trailing_return_pct": 10.2, "market_size": 2100000000}
        ]
    }"#;

    #[tokio::test]
    async fn test_fixture_from_json() {
        let equity = FixtureSource::from_json(AssetClass::Equity, DATASET).unwrap();
        let quotes = equity.fetch(&[], 90).await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].symbol(), Some("PETR4.SA"));
        assert_eq!(equity.name(), "local-equity");

        let reit = FixtureSource::from_json(AssetClass::Reit, DATASET).unwrap();
        assert!(reit.fetch(&[], 90).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fixture_symbol_selection() {
        let crypto = FixtureSource::from_json(AssetClass::Crypto, DATASET).unwrap();
        let quotes = crypto
            .fetch(&["INJ".to_string(), "NOPE".to_string()], 30)
            .await
            .unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].symbol(), Some("inj"));
        assert_eq!(quotes[1], RawQuote::empty_series("NOPE"));
    }

    #[tokio::test]
    async fn test_bundled_dataset_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/local_quotes.json");
        for class in AssetClass::ALL {
            let source = FixtureSource::from_file(class, path).unwrap();
            assert!(!source.fetch(&[], 90).await.unwrap().is_empty(), "{class}");
        }

        let missing = FixtureSource::from_file(AssetClass::Equity, "/nonexistent/quotes.json");
        assert!(matches!(missing, Err(RankerError::Config(_))));
    }

    #[tokio::test]
    async fn test_unavailable_fixture() {
        let source = FixtureSource::unavailable(AssetClass::Reit, "outage");
        let err = source.fetch(&[], 90).await.unwrap_err();
        assert!(matches!(err, RankerError::SourceUnavailable { .. }));
    }
}
