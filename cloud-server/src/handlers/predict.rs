//! Prediction handlers

use std::sync::Arc;

use axum::{extract::{Path, Query, State}, Json};
use validator::Validate;

use shieldsight_core::{BatchReport, ExplainReport, ExplanationMode, PredictOptions, PredictionOutcome};

use crate::models::{BatchInput, BatchQuery, ExplanationLookup, PredictQuery, UrlInput};
use crate::{AppResult, AppState};

fn request_options(state: &AppState, query: &PredictQuery) -> PredictOptions {
    let mut opts = PredictOptions::full();
    if !query.include_explanation {
        opts.explanation = ExplanationMode::Deferred;
    }
    opts.external_checks = state.config.external_checks_enabled && !query.skip_external_checks;
    opts
}

/// Full pipeline for one URL
pub async fn predict(
    State(state): State<AppState>,
    Query(query): Query<PredictQuery>,
    Json(input): Json<UrlInput>,
) -> AppResult<Json<PredictionOutcome>> {
    input.validate()?;
    let opts = request_options(&state, &query);
    let outcome = state.predictor.predict(&input.url, &opts).await?;
    Ok(Json(outcome))
}

/// No external checks; the explanation is deferred and fetched by hash
pub async fn fast(
    State(state): State<AppState>,
    Json(input): Json<UrlInput>,
) -> AppResult<Json<PredictionOutcome>> {
    input.validate()?;
    let outcome = state.predictor.predict(&input.url, &PredictOptions::fast()).await?;
    Ok(Json(outcome))
}

pub async fn batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
    Json(input): Json<BatchInput>,
) -> AppResult<Json<BatchReport>> {
    input.validate()?;
    let mut opts = PredictOptions::batch();
    if query.include_explanation {
        opts.explanation = ExplanationMode::Sync;
    }
    opts.external_checks = state.config.external_checks_enabled;

    let report = state.batch.run(input.urls, opts).await?;
    Ok(Json(report))
}

/// Poll a deferred explanation; pending is a status, not an error
pub async fn explanation(
    State(state): State<AppState>,
    Path(url_hash): Path<String>,
) -> Json<ExplanationLookup> {
    let status = state.predictor.explanation_status(&url_hash);
    tracing::debug!("Explanation lookup {}: {}", url_hash, status.as_str());
    Json(ExplanationLookup::from_status(&url_hash, &status))
}

/// Synchronous explanation with domain and security factors
pub async fn explain(
    State(state): State<AppState>,
    Json(input): Json<UrlInput>,
) -> AppResult<Json<Arc<ExplainReport>>> {
    input.validate()?;
    let report = state.predictor.explain(&input.url).await?;
    Ok(Json(report))
}
