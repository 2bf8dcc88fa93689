use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::error;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::error::AppError;
use crate::scrape::ScrapeService;
use crate::types::{FetchMethod, ScrapeResult};

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ScrapeService>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/scrape", get(get_scrape).post(clear_cache))
        .route("/api/stats/latency", get(get_stats_latency))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: ScrapeResult,
    pub cached: bool,
    pub method: FetchMethod,
    /// Standings are placeholder data because the live scrape failed.
    pub degraded: bool,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache_age_secs: Option<u64>,
    pub scrapes_total: u64,
    pub fallbacks_total: u64,
    pub cache_hits_total: u64,
    pub last_success_at_ms: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_scrape(State(state): State<ApiState>) -> Result<Json<ScrapeResponse>, AppError> {
    let served = state.service.get().await.inspect_err(|e| error!("API error: {e}"))?;

    Ok(Json(ScrapeResponse {
        success: true,
        data: served.snapshot.data.clone(),
        cached: served.cached,
        method: served.snapshot.method,
        degraded: served.snapshot.degraded,
    }))
}

async fn clear_cache(State(state): State<ApiState>) -> Json<MessageResponse> {
    state.service.invalidate();
    Json(MessageResponse {
        success: true,
        message: "Cache cleared successfully".to_string(),
    })
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache_age_secs: state.service.cache().age().map(|d| d.as_secs()),
        scrapes_total: state.health.scrapes_total(),
        fallbacks_total: state.health.fallbacks_total(),
        cache_hits_total: state.health.cache_hits_total(),
        last_success_at_ms: state.health.last_success_at_ms(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50_ms, p95_ms, p99_ms) = state.latency.percentiles();
    Json(LatencyResponse {
        samples: state.latency.len(),
        p50_ms,
        p95_ms,
        p99_ms,
    })
}
