//! Predictor Configuration
//!
//! Runtime knobs for the prediction pipeline. `Default` gives the
//! production values, `from_env()` lets operators override them.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::model::ModelMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Directory holding the `production_xgboost*.onnx` models and sidecars
    pub model_dir: PathBuf,
    /// Preferred model mode; falls back to `compatible`
    pub model_mode: ModelMode,
    /// Skip model loading and serve with the rule engine
    pub rule_engine_only: bool,
    /// Default phishing probability cutoff
    pub threshold: f32,

    pub prediction_cache_size: usize,
    pub feature_cache_size: usize,
    pub explanation_cache_size: usize,

    pub sync_explanation_timeout: Duration,
    pub background_explanation_timeout: Duration,
    pub availability_timeout: Duration,
    pub geo_timeout: Duration,
    pub inference_timeout: Duration,

    /// Permits for CPU-bound work (inference, scoring, explanation)
    pub cpu_workers: usize,
    /// Concurrent background explanation jobs
    pub background_workers: usize,
    /// How often the degeneracy check may re-run before serving
    pub health_recheck_interval: Duration,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(constants::DEFAULT_MODEL_DIR),
            model_mode: ModelMode::Enhanced,
            rule_engine_only: false,
            threshold: constants::DEFAULT_THRESHOLD,
            prediction_cache_size: constants::DEFAULT_PREDICTION_CACHE_SIZE,
            feature_cache_size: constants::DEFAULT_FEATURE_CACHE_SIZE,
            explanation_cache_size: constants::DEFAULT_EXPLANATION_CACHE_SIZE,
            sync_explanation_timeout: Duration::from_millis(constants::DEFAULT_SYNC_EXPLANATION_TIMEOUT_MS),
            background_explanation_timeout: Duration::from_millis(constants::DEFAULT_BACKGROUND_EXPLANATION_TIMEOUT_MS),
            availability_timeout: Duration::from_millis(constants::DEFAULT_AVAILABILITY_TIMEOUT_MS),
            geo_timeout: Duration::from_millis(constants::DEFAULT_GEO_TIMEOUT_MS),
            inference_timeout: Duration::from_millis(constants::DEFAULT_INFERENCE_TIMEOUT_MS),
            cpu_workers: 4,
            background_workers: constants::DEFAULT_BACKGROUND_WORKERS,
            health_recheck_interval: Duration::from_secs(constants::DEFAULT_HEALTH_RECHECK_SECS),
        }
    }
}

impl PredictorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mode = constants::get_model_mode();
        let model_mode = ModelMode::parse(&mode).unwrap_or_else(|| {
            log::warn!("Unknown model mode '{}', using enhanced", mode);
            ModelMode::Enhanced
        });

        Self {
            model_dir: PathBuf::from(constants::get_model_dir()),
            model_mode,
            rule_engine_only: constants::is_rule_engine_only(),
            threshold: constants::get_threshold(),
            prediction_cache_size: constants::get_prediction_cache_size(),
            sync_explanation_timeout: constants::get_sync_explanation_timeout(),
            background_explanation_timeout: constants::get_background_explanation_timeout(),
            availability_timeout: constants::get_availability_timeout(),
            geo_timeout: constants::get_geo_timeout(),
            inference_timeout: constants::get_inference_timeout(),
            cpu_workers: constants::get_cpu_workers().max(1),
            health_recheck_interval: constants::get_health_recheck_interval(),
            ..Self::default()
        }
    }

    /// Config for the rule engine alone, no model directory needed
    pub fn rule_based() -> Self {
        Self {
            rule_engine_only: true,
            ..Self::default()
        }
    }
}
