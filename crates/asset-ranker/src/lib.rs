//! # asset-ranker
//!
//! Ranks equities, REITs and crypto assets by their return over a lookback
//! window and answers simple recommendation questions about the leaders.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌────────────────┐   ┌─────────┐
//! │ SourceAdapter│──►│ normalize  │──►│ compute_return │──►│  rank   │
//! │ yahoo / cg   │   │ band filter│   │ (last-first)/f │   │ top N   │
//! └──────────────┘   └────────────┘   └────────────────┘   └────┬────┘
//!                                                               │
//!                          ┌──────────────┐    ┌────────────────┤
//!                          │ respond      │◄───│ RankingResult  │
//!                          │ CSV export   │◄───│ (per class)    │
//!                          └──────────────┘    └────────────────┘
//! ```
//!
//! Every class runs independently: a source outage leaves its class empty
//! and the other two untouched.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod ranking;
pub mod responder;
pub mod returns;
pub mod source;

pub use config::PipelineConfig;
pub use error::{RankerError, Result};
pub use export::{rankings_to_csv, run_to_csv};
pub use model::{AssetClass, AssetQuote, PricePoint, RankingResult, RawQuote};
pub use normalize::{normalize, MarketSizeBand};
pub use pipeline::{ClassRanking, Pipeline, PipelineRun, SourceStatus};
pub use ranking::{rank, RankingEngine};
pub use responder::{respond, Intent, Reply};
pub use returns::compute_return;
pub use source::SourceAdapter;
