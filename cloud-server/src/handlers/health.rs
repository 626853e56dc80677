//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use shieldsight_core::logic::cache::CacheStats;
use shieldsight_core::logic::model::ModelInfo;
use shieldsight_core::PredictorHealth;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
}

pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

#[derive(Serialize)]
pub struct PredictorHealthResponse {
    status: &'static str,
    service: &'static str,
    #[serde(flatten)]
    health: PredictorHealth,
    timestamp: i64,
}

/// Model and cache health; never errors, an unloaded model reports "unavailable"
pub async fn predictor(State(state): State<AppState>) -> Json<PredictorHealthResponse> {
    let health = state.predictor.health();
    let status = match (health.model_loaded, health.using_fallback) {
        (false, _) => "unavailable",
        (true, true) => "degraded",
        (true, false) => "healthy",
    };

    Json(PredictorHealthResponse {
        status,
        service: "prediction-api",
        health,
        timestamp: chrono::Utc::now().timestamp(),
    })
}

#[derive(Serialize)]
pub struct StatsResponse {
    prediction_cache: CacheStats,
    model: ModelInfo,
    batch_concurrency: usize,
    batch_max_size: usize,
    external_checks_enabled: bool,
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        prediction_cache: state.predictor.cache_stats(),
        model: state.predictor.model_info(),
        batch_concurrency: state.batch.concurrency(),
        batch_max_size: state.batch.max_size(),
        external_checks_enabled: state.config.external_checks_enabled,
    })
}

pub async fn model_info(State(state): State<AppState>) -> Json<ModelInfo> {
    Json(state.predictor.model_info())
}
