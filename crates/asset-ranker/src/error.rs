//! Error Types for Asset Ranker

use thiserror::Error;

use crate::model::AssetClass;

pub type Result<T> = std::result::Result<T, RankerError>;

#[derive(Error, Debug)]
pub enum RankerError {
    /// Upstream call failed, timed out or returned an unusable body
    #[error("Source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// A raw record could not be mapped onto an `AssetQuote`
    #[error("Unresolvable quote {symbol}: {reason}")]
    UnresolvableQuote { symbol: String, reason: String },

    /// Crypto record rejected by the market-size band filter
    #[error("Market size of {symbol} is outside the admissible band")]
    OutsideMarketBand { symbol: String },

    #[error("Insufficient price history for {0}")]
    InsufficientHistory(String),

    /// Top element requested from a ranking with no entries
    #[error("No ranked data available for {0}")]
    EmptyRanking(AssetClass),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RankerError {
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn unresolvable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvableQuote {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Errors the pipeline absorbs at the layer that raised them
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. }
                | Self::UnresolvableQuote { .. }
                | Self::OutsideMarketBand { .. }
                | Self::InsufficientHistory(_)
                | Self::EmptyRanking(_)
                | Self::Network(_)
        )
    }

    /// Convert to a message safe to show to an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::SourceUnavailable { .. } | Self::Network(_) => {
                "Market data is temporarily unavailable. Please try again.".into()
            }
            Self::EmptyRanking(class) => format!("No data available for {} right now.", class.label()),
            Self::Config(msg) => format!("Service configuration error: {msg}"),
            _ => "Some market records could not be processed.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(RankerError::unavailable("yahoo", "timeout").is_recoverable());
        assert!(RankerError::EmptyRanking(AssetClass::Crypto).is_recoverable());
        assert!(!RankerError::Config("top_n".into()).is_recoverable());
    }

    #[test]
    fn test_user_message_names_class() {
        let msg = RankerError::EmptyRanking(AssetClass::Reit).user_message();
        assert!(msg.contains("REIT"));
    }
}
