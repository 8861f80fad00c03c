//! asset-ranker HTTP Server
//!
//! Axum-based server exposing class rankings, the recommendation responder
//! and a CSV export. Every request runs one pipeline cycle; live sources are
//! memoized for `RANKER_MEMO_TTL_SECS`.

mod handlers;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_ranker::{Pipeline, PipelineConfig};

use crate::handlers::{ask, class_rankings, export_csv, health_check, rankings};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = PipelineConfig::from_env()?;

    tracing::info!(
        window_days = config.window_days,
        top_n = config.top_n,
        vs_currency = %config.vs_currency,
        "pipeline configured"
    );
    match &config.market_band {
        Some(band) => tracing::info!("  Crypto market-cap band: {} .. {}", band.min, band.max),
        None => tracing::warn!("⚠ Crypto market-cap band disabled"),
    }
    match &config.fallback_path {
        Some(path) => tracing::info!("✓ Local fallback dataset: {}", path.display()),
        None => tracing::warn!("⚠ No fallback dataset - a dead source leaves its class empty"),
    }

    let state = AppState::new(Pipeline::from_config(config)?);
    let app = router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 asset-ranker server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                - Health check");
    tracing::info!("  GET  /api/rankings          - All class rankings");
    tracing::info!("  GET  /api/rankings/{{class}}  - One class ranking");
    tracing::info!("  POST /api/ask               - Ask for a recommendation");
    tracing::info!("  GET  /api/export.csv        - Download rankings as CSV");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/rankings", get(rankings))
        .route("/api/rankings/{class}", get(class_rankings))
        .route("/api/ask", post(ask))
        .route("/api/export.csv", get(export_csv))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
