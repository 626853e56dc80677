//! ShieldSight Cloud Server
//!
//! HTTP surface over the prediction core.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SHIELDSIGHT CLOUD                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐ │
//! │  │  API      │  │  Predictor    │  │  Batch Controller   │ │
//! │  │  (Axum)   │─▶│  (pipeline +  │◀─│  (bounded fan-out)  │ │
//! │  │           │  │   caches)     │  │                     │ │
//! │  └───────────┘  └───────┬───────┘  └─────────────────────┘ │
//! │                         ▼                                   │
//! │          ONNX model / rule engine, availability, geo       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod handlers;
mod error;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shieldsight_core::{BatchController, Predictor};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "shieldsight_server=debug,shieldsight_core=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("ShieldSight Cloud Server starting ({})...", config.environment);

    // Load the classifier; an unloaded predictor still serves 503s
    let predictor = Arc::new(Predictor::new(config.predictor.clone()));
    match predictor.load() {
        Ok(()) => tracing::info!("Model ready: {:?}", predictor.model_info().model_name),
        Err(e) if config.is_production() => return Err(e).context("model load failed"),
        Err(e) => tracing::warn!("Model load failed: {} - prediction endpoints return 503", e),
    }

    let state = AppState::new(predictor.clone(), config.clone());
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    predictor.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub batch: Arc<BatchController>,
    pub config: config::Config,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>, config: config::Config) -> Self {
        let batch = BatchController::new(
            Arc::clone(&predictor),
            config.batch_concurrency,
            config.batch_max_size,
        );
        Self {
            predictor,
            batch: Arc::new(batch),
            config,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let prediction_routes = Router::new()
        .route("/predict", post(handlers::predict::predict))
        .route("/predict/fast", post(handlers::predict::fast))
        .route("/predict/batch", post(handlers::predict::batch))
        .route("/predict/explain", post(handlers::predict::explain))
        .route("/predict/explanation/:url_hash", get(handlers::predict::explanation));

    let status_routes = Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict/health", get(handlers::health::predictor))
        .route("/predict/stats", get(handlers::health::stats))
        .route("/model/info", get(handlers::health::model_info));

    Router::new()
        .merge(status_routes)
        .merge(prediction_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
