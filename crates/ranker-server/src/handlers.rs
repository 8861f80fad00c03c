//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use asset_ranker::{respond, run_to_csv, AssetClass, ClassRanking, PipelineRun, Reply};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub window_days: u32,
    pub top_n: usize,
}

#[derive(Debug, Serialize)]
pub struct RankingsResponse {
    pub run_id: String,
    #[serde(flatten)]
    pub run: PipelineRun,
}

#[derive(Debug, Serialize)]
pub struct ClassRankingResponse {
    pub run_id: String,
    pub asset_class: AssetClass,
    /// Presentation text when the class has nothing ranked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub class: ClassRanking,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub principal: Decimal,
    /// Class the question is answered against
    #[serde(default = "default_ask_class")]
    pub asset_class: AssetClass,
}

fn default_ask_class() -> AssetClass {
    AssetClass::Crypto
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub run_id: String,
    #[serde(flatten)]
    pub reply: Reply,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>, code: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

fn run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = state.pipeline.config();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        window_days: config.window_days,
        top_n: config.top_n,
    })
}

/// All three class rankings from a fresh cycle
pub async fn rankings(State(state): State<AppState>) -> Json<RankingsResponse> {
    let run = state.pipeline.run().await;

    Json(RankingsResponse { run_id: run_id(), run })
}

/// One class ranking; `class` accepts the same aliases as `AssetClass`
pub async fn class_rankings(
    State(state): State<AppState>,
    Path(class): Path<String>,
) -> Result<Json<ClassRankingResponse>, ApiError> {
    let asset_class: AssetClass = class
        .parse()
        .map_err(|_| bad_request(format!("Unknown asset class: {class}"), "UNKNOWN_ASSET_CLASS"))?;

    let run = state.pipeline.run().await;
    let class = run.class(asset_class).clone();
    let message = class.ranking.top().err().map(|e| e.user_message());

    Ok(Json(ClassRankingResponse {
        run_id: run_id(),
        asset_class,
        message,
        class,
    }))
}

/// Answer a recommendation question against the current ranking
pub async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    if payload.principal.is_sign_negative() {
        return Err(bad_request("Principal must not be negative", "INVALID_PRINCIPAL"));
    }

    let run = state.pipeline.run().await;
    let reply = respond(&payload.query, run.ranking(payload.asset_class), payload.principal);

    tracing::info!(
        intent = ?reply.intent,
        asset_class = %payload.asset_class,
        available = reply.available,
        "answered query"
    );

    Ok(Json(AskResponse { run_id: run_id(), reply }))
}

/// CSV download of every class ranking
pub async fn export_csv(State(state): State<AppState>) -> impl IntoResponse {
    let run = state.pipeline.run().await;

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"asset_rankings.csv\""),
        ],
        run_to_csv(&run),
    )
}
