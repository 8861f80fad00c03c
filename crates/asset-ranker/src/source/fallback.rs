//! Fallback Source
//!
//! Consults a lower-priority source (typically the local dataset) only when
//! the primary reports that it is unavailable.

use std::sync::Arc;

use async_trait::async_trait;

use super::SourceAdapter;
use crate::error::{RankerError, Result};
use crate::model::{AssetClass, RawQuote};

pub struct FallbackSource {
    primary: Arc<dyn SourceAdapter>,
    secondary: Arc<dyn SourceAdapter>,
}

impl FallbackSource {
    pub fn new(primary: Arc<dyn SourceAdapter>, secondary: Arc<dyn SourceAdapter>) -> Result<Self> {
        if primary.asset_class() != secondary.asset_class() {
            return Err(RankerError::Config(format!(
                "fallback {} serves {} but primary {} serves {}",
                secondary.name(),
                secondary.asset_class(),
                primary.name(),
                primary.asset_class()
            )));
        }
        Ok(Self { primary, secondary })
    }
}

#[async_trait]
impl SourceAdapter for FallbackSource {
    async fn fetch(&self, symbols: &[String], window_days: u32) -> Result<Vec<RawQuote>> {
        match self.primary.fetch(symbols, window_days).await {
            Ok(quotes) => Ok(quotes),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    primary = %self.primary.name(),
                    fallback = %self.secondary.name(),
                    "primary source failed, using fallback: {}",
                    e
                );
                self.secondary.fetch(symbols, window_days).await
            }
            Err(e) => Err(e),
        }
    }

    fn asset_class(&self) -> AssetClass {
        self.primary.asset_class()
    }

    fn effective_window_days(&self, window_days: u32) -> u32 {
        self.primary.effective_window_days(window_days)
    }

    fn name(&self) -> &str {
        self.primary.name()
    }
}
