//! Ranking Pipeline
//!
//! One fetch cycle: the three class sources run concurrently, each under its
//! own timeout, and every class is normalized and ranked on its own. A failed
//! or slow source yields an empty ranking for its class and nothing else.
//!
//! ```text
//! SourceAdapter ──► normalize ──► compute_return ──► rank ──► PipelineRun
//!   (equity)                                                  ├─ equity
//!   (reit)      ─── same path, independently ───────────────► ├─ reit
//!   (crypto)                                                  └─ crypto
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::{RankerError, Result};
use crate::model::{AssetClass, RawQuote, RankingResult};
use crate::normalize::{normalize_batch, MarketSizeBand};
use crate::ranking::RankingEngine;
use crate::source::{
    CoinGeckoConfig, CoinGeckoSource, FallbackSource, FixtureSource, MemoizedSource,
    SourceAdapter, YahooChartSource, YahooConfig,
};

/// Whether a class's source delivered data this cycle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Available,
    Unavailable { reason: String },
}

impl SourceStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Ranking outcome for one asset class
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassRanking {
    pub source: String,
    pub status: SourceStatus,
    /// Lookback the source actually covered; can differ from the requested
    /// window for providers with fixed windows
    pub window_days: u32,
    pub ranking: RankingResult,
}

impl ClassRanking {
    pub fn asset_class(&self) -> AssetClass {
        self.ranking.asset_class
    }
}

/// Result of one fetch cycle, one ranking per class
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub generated_at: DateTime<Utc>,
    pub window_days: u32,
    pub top_n: usize,
    pub equity: ClassRanking,
    pub reit: ClassRanking,
    pub crypto: ClassRanking,
}

impl PipelineRun {
    pub fn class(&self, asset_class: AssetClass) -> &ClassRanking {
        match asset_class {
            AssetClass::Equity => &self.equity,
            AssetClass::Reit => &self.reit,
            AssetClass::Crypto => &self.crypto,
        }
    }

    pub fn ranking(&self, asset_class: AssetClass) -> &RankingResult {
        &self.class(asset_class).ranking
    }

    pub fn classes(&self) -> [&ClassRanking; 3] {
        [&self.equity, &self.reit, &self.crypto]
    }
}

/// Fetch-normalize-rank pipeline over three class sources
pub struct Pipeline {
    equity: Arc<dyn SourceAdapter>,
    reit: Arc<dyn SourceAdapter>,
    crypto: Arc<dyn SourceAdapter>,
    config: PipelineConfig,
    engine: RankingEngine,
}

impl Pipeline {
    /// Build with explicit sources; each must serve the class of its slot
    pub fn new(
        config: PipelineConfig,
        equity: Arc<dyn SourceAdapter>,
        reit: Arc<dyn SourceAdapter>,
        crypto: Arc<dyn SourceAdapter>,
    ) -> Result<Self> {
        config.validate()?;

        for (expected, source) in [
            (AssetClass::Equity, &equity),
            (AssetClass::Reit, &reit),
            (AssetClass::Crypto, &crypto),
        ] {
            if source.asset_class() != expected {
                return Err(RankerError::Config(format!(
                    "source {} serves {} but was given the {} slot",
                    source.name(),
                    source.asset_class(),
                    expected
                )));
            }
        }

        Ok(Self {
            engine: RankingEngine::new(config.top_n),
            equity,
            reit,
            crypto,
            config,
        })
    }

    /// Build the live sources described by `config`
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        // Leave the local fallback room inside the per-class timeout
        let http_timeout = if config.fallback_path.is_some() {
            config.source_timeout / 2
        } else {
            config.source_timeout
        };
        let yahoo = |base_url: &str| YahooConfig {
            base_url: base_url.to_string(),
            timeout: http_timeout,
        };

        let equity: Arc<dyn SourceAdapter> =
            Arc::new(YahooChartSource::new(AssetClass::Equity, yahoo(&config.yahoo_base_url))?);
        let reit: Arc<dyn SourceAdapter> =
            Arc::new(YahooChartSource::new(AssetClass::Reit, yahoo(&config.yahoo_base_url))?);
        let crypto: Arc<dyn SourceAdapter> = Arc::new(CoinGeckoSource::new(CoinGeckoConfig {
            base_url: config.coingecko_base_url.clone(),
            vs_currency: config.vs_currency.clone(),
            order: config.crypto_order.clone(),
            per_page: config.crypto_page_size,
            page: 1,
            timeout: http_timeout,
        })?);

        let wrap = |source: Arc<dyn SourceAdapter>| -> Result<Arc<dyn SourceAdapter>> {
            let source = match &config.fallback_path {
                Some(path) => with_fallback(source, path)?,
                None => source,
            };
            Ok(memoized(source, config.memo_ttl))
        };
        let [equity, reit, crypto] = [equity, reit, crypto].map(wrap);

        Self::new(config, equity?, reit?, crypto?)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one fetch cycle. Never fails: unavailable sources show up as
    /// empty rankings with an `Unavailable` status.
    pub async fn run(&self) -> PipelineRun {
        let (equity, reit, crypto) = tokio::join!(
            self.run_class(self.equity.as_ref(), &self.config.equity_symbols),
            self.run_class(self.reit.as_ref(), &self.config.reit_symbols),
            self.run_class(self.crypto.as_ref(), &self.config.crypto_symbols),
        );

        tracing::info!(
            equity = equity.ranking.len(),
            reit = reit.ranking.len(),
            crypto = crypto.ranking.len(),
            "ranking cycle complete"
        );

        PipelineRun {
            generated_at: Utc::now(),
            window_days: self.config.window_days,
            top_n: self.config.top_n,
            equity,
            reit,
            crypto,
        }
    }

    /// Normalize and rank raw quotes fetched elsewhere
    pub fn rank_raw(&self, asset_class: AssetClass, raws: Vec<RawQuote>) -> RankingResult {
        let quotes = normalize_batch(raws, asset_class, self.band());
        self.engine.rank(asset_class, quotes)
    }

    fn band(&self) -> Option<&MarketSizeBand> {
        self.config.market_band.as_ref()
    }

    async fn run_class(&self, source: &dyn SourceAdapter, symbols: &[String]) -> ClassRanking {
        let asset_class = source.asset_class();
        let fetched = tokio::time::timeout(
            self.config.source_timeout,
            source.fetch(symbols, self.config.window_days),
        )
        .await;

        let (raws, status) = match fetched {
            Ok(Ok(raws)) => (raws, SourceStatus::Available),
            Ok(Err(e)) => {
                tracing::warn!(source = %source.name(), %asset_class, "source failed: {}", e);
                (Vec::new(), SourceStatus::Unavailable { reason: e.to_string() })
            }
            Err(_) => {
                let e = RankerError::unavailable(
                    source.name(),
                    format!("timed out after {}", format_timeout(self.config.source_timeout)),
                );
                tracing::warn!(source = %source.name(), %asset_class, "{}", e);
                (Vec::new(), SourceStatus::Unavailable { reason: e.to_string() })
            }
        };

        let ranking = self.rank_raw(asset_class, raws);

        ClassRanking {
            source: source.name().to_string(),
            status,
            window_days: source.effective_window_days(self.config.window_days),
            ranking,
        }
    }
}

fn with_fallback(
    source: Arc<dyn SourceAdapter>,
    path: &std::path::Path,
) -> Result<Arc<dyn SourceAdapter>> {
    let local = FixtureSource::from_file(source.asset_class(), path)?;
    Ok(Arc::new(FallbackSource::new(source, Arc::new(local))?))
}

fn memoized(source: Arc<dyn SourceAdapter>, ttl: Duration) -> Arc<dyn SourceAdapter> {
    if ttl.is_zero() {
        source
    } else {
        Arc::new(MemoizedSource::new(source, ttl))
    }
}

fn format_timeout(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricePoint;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn series(symbol: &str, prices: &[Decimal]) -> RawQuote {
        let start = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        RawQuote::Series {
            symbol: symbol.into(),
            display_name: None,
            points: prices
                .iter()
                .enumerate()
                .map(|(i, p)| PricePoint::new(start + chrono::Duration::days(i as i64), *p))
                .collect(),
        }
    }

    fn coin(symbol: &str, ret: Decimal, cap: Decimal) -> RawQuote {
        RawQuote::Snapshot {
            symbol: Some(symbol.into()),
            name: None,
            current_price: Some(dec!(10)),
            trailing_return_pct: Some(ret),
            market_size: Some(cap),
        }
    }

    fn equities() -> FixtureSource {
        FixtureSource::new(
            AssetClass::Equity,
            vec![
                series("PETR4.SA", &[dec!(100), dec!(105), dec!(98), dec!(120)]),
                series("VALE3.SA", &[dec!(60), dec!(57)]),
                RawQuote::empty_series("ITUB4.SA"),
            ],
        )
    }

    fn reits() -> FixtureSource {
        FixtureSource::new(
            AssetClass::Reit,
            vec![series("MXRF11.SA", &[dec!(10), dec!(10.5)])],
        )
    }

    fn cryptos() -> FixtureSource {
        FixtureSource::new(
            AssetClass::Crypto,
            vec![
                coin("PEPE", dec!(400), dec!(500_000_000)),
                coin("RNDR", dec!(25), dec!(4_000_000_000)),
                coin("BTC", dec!(30), dec!(1_900_000_000_000)),
                coin("INJ", dec!(12), dec!(2_000_000_000)),
            ],
        )
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            equity_symbols: Vec::new(),
            reit_symbols: Vec::new(),
            ..PipelineConfig::default()
        }
    }

    fn pipeline(
        equity: impl SourceAdapter + 'static,
        reit: impl SourceAdapter + 'static,
        crypto: impl SourceAdapter + 'static,
    ) -> Pipeline {
        Pipeline::new(config(), Arc::new(equity), Arc::new(reit), Arc::new(crypto)).unwrap()
    }

    fn symbols(ranking: &RankingResult) -> Vec<&str> {
        ranking.iter().map(|q| q.symbol.as_str()).collect()
    }

    struct Stalled;

    #[async_trait]
    impl SourceAdapter for Stalled {
        async fn fetch(&self, _symbols: &[String], _window_days: u32) -> Result<Vec<RawQuote>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }

        fn asset_class(&self) -> AssetClass {
            AssetClass::Reit
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    struct FixedWindow(FixtureSource);

    #[async_trait]
    impl SourceAdapter for FixedWindow {
        async fn fetch(&self, symbols: &[String], window_days: u32) -> Result<Vec<RawQuote>> {
            self.0.fetch(symbols, window_days).await
        }

        fn asset_class(&self) -> AssetClass {
            self.0.asset_class()
        }

        fn effective_window_days(&self, _window_days: u32) -> u32 {
            30
        }

        fn name(&self) -> &str {
            self.0.name()
        }
    }

    #[tokio::test]
    async fn test_effective_window_reported_per_class() {
        let run = pipeline(equities(), reits(), FixedWindow(cryptos())).run().await;
        assert_eq!(run.window_days, 90);
        assert_eq!(run.equity.window_days, 90);
        assert_eq!(run.reit.window_days, 90);
        assert_eq!(run.crypto.window_days, 30);
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let run = pipeline(equities(), reits(), cryptos()).run().await;

        assert_eq!(symbols(&run.equity.ranking), vec!["PETR4.SA", "VALE3.SA"]);
        assert_eq!(run.equity.ranking.top().unwrap().window_return_pct, Some(dec!(20)));
        assert_eq!(symbols(&run.reit.ranking), vec!["MXRF11.SA"]);
        assert!(run.classes().iter().all(|c| c.status.is_available()));
        assert_eq!(run.window_days, 90);
    }

    #[tokio::test]
    async fn test_market_band_excludes_highest_return() {
        let run = pipeline(equities(), reits(), cryptos()).run().await;
        // PEPE (micro-cap) and BTC (mega-cap) are out of band
        assert_eq!(symbols(&run.crypto.ranking), vec!["RNDR", "INJ"]);
    }

    #[tokio::test]
    async fn test_band_disabled_keeps_everything() {
        let config = PipelineConfig {
            market_band: None,
            ..config()
        };
        let pipeline = Pipeline::new(
            config,
            Arc::new(equities()),
            Arc::new(reits()),
            Arc::new(cryptos()),
        )
        .unwrap();
        let run = pipeline.run().await;
        assert_eq!(symbols(&run.crypto.ranking), vec!["PEPE", "BTC", "RNDR", "INJ"]);
    }

    #[tokio::test]
    async fn test_one_source_down_leaves_others_unaffected() {
        let healthy = pipeline(equities(), reits(), cryptos()).run().await;
        let degraded = pipeline(
            equities(),
            FixtureSource::unavailable(AssetClass::Reit, "HTTP 503"),
            cryptos(),
        )
        .run()
        .await;

        assert!(degraded.reit.ranking.is_empty());
        assert!(!degraded.reit.status.is_available());
        assert_eq!(degraded.equity.ranking, healthy.equity.ranking);
        assert_eq!(degraded.crypto.ranking, healthy.crypto.ranking);
    }

    #[tokio::test]
    async fn test_all_sources_down() {
        let run = pipeline(
            FixtureSource::unavailable(AssetClass::Equity, "dns"),
            FixtureSource::unavailable(AssetClass::Reit, "dns"),
            FixtureSource::unavailable(AssetClass::Crypto, "dns"),
        )
        .run()
        .await;

        for class in run.classes() {
            assert!(class.ranking.is_empty());
            assert!(matches!(class.status, SourceStatus::Unavailable { .. }));
        }

        let reply = crate::responder::respond("best coin?", run.ranking(AssetClass::Crypto), dec!(1000));
        assert!(!reply.available);
    }

    #[tokio::test]
    async fn test_slow_source_times_out() {
        let config = PipelineConfig {
            source_timeout: Duration::from_millis(50),
            ..config()
        };
        let pipeline = Pipeline::new(
            config,
            Arc::new(equities()),
            Arc::new(Stalled),
            Arc::new(cryptos()),
        )
        .unwrap();

        let run = pipeline.run().await;
        match &run.reit.status {
            SourceStatus::Unavailable { reason } => assert!(reason.contains("timed out after 50ms")),
            SourceStatus::Available => panic!("expected timeout"),
        }
        assert_eq!(run.equity.ranking.len(), 2);
    }

    #[test]
    fn test_sources_must_match_slots() {
        let result = Pipeline::new(
            config(),
            Arc::new(reits()),
            Arc::new(equities()),
            Arc::new(cryptos()),
        );
        assert!(matches!(result, Err(RankerError::Config(_))));
    }

    #[test]
    fn test_rank_raw() {
        let pipeline = pipeline(equities(), reits(), cryptos());
        let ranking = pipeline.rank_raw(
            AssetClass::Equity,
            vec![series("A", &[dec!(1), dec!(2)]), series("B", &[dec!(1), dec!(3)])],
        );
        assert_eq!(symbols(&ranking), vec!["B", "A"]);
    }

    #[test]
    fn test_from_config_builds_live_sources() {
        let pipeline = Pipeline::from_config(PipelineConfig::default()).unwrap();
        assert_eq!(pipeline.config().top_n, 5);
    }
}
