//! Router tests over a rule-engine predictor with external checks disabled

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use shieldsight_core::logic::cache::SystemClock;
use shieldsight_core::logic::model::{ClassifierBackend, RuleEngine};
use shieldsight_core::logic::signals::SignalHub;
use shieldsight_core::{Predictor, PredictorConfig};

use crate::config::Config;
use crate::{create_router, AppState};

fn test_config(batch_max_size: usize) -> Config {
    Config {
        port: 0,
        environment: "test".to_string(),
        batch_concurrency: 4,
        batch_max_size,
        external_checks_enabled: false,
        predictor: PredictorConfig::rule_based(),
    }
}

fn state_with(backend: ClassifierBackend, batch_max_size: usize) -> AppState {
    let config = test_config(batch_max_size);
    let predictor = Predictor::with_parts(
        config.predictor.clone(),
        Arc::new(backend),
        SignalHub::disabled(),
        Arc::new(SystemClock),
    );
    AppState::new(Arc::new(predictor), config)
}

fn rule_state() -> AppState {
    state_with(ClassifierBackend::rule_based(RuleEngine::deterministic()), 3)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(rule_state(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_predict_returns_verdict() {
    let (status, body) = send(rule_state(), post("/predict", json!({"url": "https://www.google.com"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "legitimate");
    assert_eq!(body["from_cache"], false);
    assert!(body["confidence"].as_f64().unwrap() >= 0.8);
    assert!(body["threat"]["index"].is_number());
    assert_eq!(body["metadata"]["url_hash"].as_str().unwrap().len(), 64);
    assert!(body["metadata"]["processing_time_ms"].is_number());
}

#[tokio::test]
async fn test_predict_second_call_is_cached() {
    let state = rule_state();
    let request = || post("/predict?include_explanation=false", json!({"url": "http://example.com/login"}));
    let (_, first) = send(state.clone(), request()).await;
    let (status, second) = send(state, request()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["from_cache"], false);
    assert_eq!(second["from_cache"], true);
    assert_eq!(first["metadata"]["url_hash"], second["metadata"]["url_hash"]);
}

#[tokio::test]
async fn test_invalid_url_is_400() {
    let (status, body) = send(rule_state(), post("/predict", json!({"url": "javascript:alert(1)"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidInput");
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_empty_url_fails_validation() {
    let (status, body) = send(rule_state(), post("/predict/fast", json!({"url": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_unloaded_model_is_503() {
    let backend = ClassifierBackend::new(RuleEngine::deterministic(), Duration::from_secs(300));
    let state = state_with(backend, 3);
    let (status, body) = send(state.clone(), post("/predict", json!({"url": "https://example.com"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "ServiceUnavailable");

    let (status, body) = send(state, get("/predict/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_batch_isolates_failures() {
    let urls = json!({"urls": ["https://www.google.com", "not a url", "http://paypa1.com/verify"]});
    let (status, body) = send(rule_state(), post("/predict/batch", urls)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["successful"], 2);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["errors"][0]["index"], 1);
    assert_eq!(body["concurrency_limit"], 4);
}

#[tokio::test]
async fn test_batch_over_limit() {
    let urls: Vec<String> = (0..4).map(|i| format!("https://site{}.com", i)).collect();
    let (status, body) = send(rule_state(), post("/predict/batch", json!({ "urls": urls }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BatchLimitExceeded");
}

#[tokio::test]
async fn test_explanation_lookup() {
    let state = rule_state();
    let (status, body) = send(state.clone(), post("/predict/fast", json!({"url": "http://secure-login-verify.xyz"}))).await;
    assert_eq!(status, StatusCode::OK);
    let hash = body["metadata"]["url_hash"].as_str().unwrap().to_string();

    let (status, body) = send(state.clone(), get(&format!("/predict/explanation/{}", hash))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["status"] == "pending" || body["status"] == "found");

    let (status, body) = send(state, get("/predict/explanation/deadbeef")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unknown");
}

#[tokio::test]
async fn test_explain_has_domain_factor() {
    let (status, body) = send(rule_state(), post("/predict/explain", json!({"url": "http://paypa1.com/signin"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "phishing");
    let first = &body["top_features"][0];
    assert!(first["feature"].as_str().unwrap().ends_with("Rule"));
    assert!(first["contribution"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_stats() {
    let (status, body) = send(rule_state(), get("/predict/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["batch_max_size"], 3);
    assert_eq!(body["external_checks_enabled"], false);
    assert!(body["prediction_cache"]["capacity"].as_u64().unwrap() > 0);
}
