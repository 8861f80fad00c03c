//! Memoizing Source
//!
//! Remembers successful fetches per `(symbols, window_days)` for a fixed TTL.
//! Failures are never stored, so an outage is retried on the next call.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::SourceAdapter;
use crate::error::Result;
use crate::model::{AssetClass, RawQuote};

type MemoKey = (Vec<String>, u32);

/// Wraps another source with a short-lived memo
pub struct MemoizedSource<S> {
    inner: S,
    ttl: Duration,
    entries: RwLock<HashMap<MemoKey, (Instant, Vec<RawQuote>)>>,
}

impl<S: SourceAdapter> MemoizedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: SourceAdapter> SourceAdapter for MemoizedSource<S> {
    async fn fetch(&self, symbols: &[String], window_days: u32) -> Result<Vec<RawQuote>> {
        let key: MemoKey = (symbols.to_vec(), window_days);

        {
            let entries = self.entries.read().await;
            if let Some((stored_at, quotes)) = entries.get(&key) {
                if stored_at.elapsed() < self.ttl {
                    tracing::debug!(source = %self.inner.name(), "memo hit");
                    return Ok(quotes.clone());
                }
            }
        }

        let quotes = self.inner.fetch(symbols, window_days).await?;

        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        entries.insert(key, (Instant::now(), quotes.clone()));

        Ok(quotes)
    }

    fn asset_class(&self) -> AssetClass {
        self.inner.asset_class()
    }

    fn effective_window_days(&self, window_days: u32) -> u32 {
        self.inner.effective_window_days(window_days)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RankerError;
    use crate::source::FixtureSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        inner: FixtureSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceAdapter for Counting {
        async fn fetch(&self, symbols: &[String], window_days: u32) -> Result<Vec<RawQuote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(symbols, window_days).await
        }

        fn asset_class(&self) -> AssetClass {
            self.inner.asset_class()
        }

        fn name(&self) -> &str {
            self.inner.name()
        }
    }

    fn counting(inner: FixtureSource) -> Counting {
        Counting {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn symbols() -> Vec<String> {
        vec!["PETR4.SA".to_string()]
    }

    #[tokio::test]
    async fn test_repeated_fetch_is_memoized() {
        let source = MemoizedSource::new(
            counting(FixtureSource::new(AssetClass::Equity, Vec::new())),
            Duration::from_secs(60),
        );

        source.fetch(&symbols(), 90).await.unwrap();
        source.fetch(&symbols(), 90).await.unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 1);

        // Different window is a different key
        source.fetch(&symbols(), 30).await.unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_refetch() {
        let source = MemoizedSource::new(
            counting(FixtureSource::new(AssetClass::Equity, Vec::new())),
            Duration::ZERO,
        );

        source.fetch(&symbols(), 90).await.unwrap();
        source.fetch(&symbols(), 90).await.unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_not_memoized() {
        let source = MemoizedSource::new(
            counting(FixtureSource::unavailable(AssetClass::Crypto, "down")),
            Duration::from_secs(60),
        );

        for _ in 0..2 {
            let err = source.fetch(&[], 30).await.unwrap_err();
            assert!(matches!(err, RankerError::SourceUnavailable { .. }));
        }
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
    }
}
