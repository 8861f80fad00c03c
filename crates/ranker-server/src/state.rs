//! Application State

use std::sync::Arc;

use asset_ranker::Pipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Fetch-normalize-rank pipeline, one run per request
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
