//! Central Configuration Constants
//!
//! Single source of truth for all prediction defaults.
//! Every tunable here has a `get_*` helper that reads the environment first.

use std::time::Duration;

/// Default model directory
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Default model mode (`compatible`, `enhanced`, `default`)
pub const DEFAULT_MODEL_MODE: &str = "enhanced";

/// Phishing probability cutoff
pub const DEFAULT_THRESHOLD: f32 = 0.85;

/// Maximum accepted URL length
pub const MAX_URL_LENGTH: usize = 2048;

/// Minimum accepted URL length
pub const MIN_URL_LENGTH: usize = 4;

/// Prediction cache capacity (entries)
pub const DEFAULT_PREDICTION_CACHE_SIZE: usize = 10_000;

/// Feature memo capacity (entries)
pub const DEFAULT_FEATURE_CACHE_SIZE: usize = 4_096;

/// Explanation store capacity (entries)
pub const DEFAULT_EXPLANATION_CACHE_SIZE: usize = 4_096;

/// Feature memo TTL (seconds)
pub const FEATURE_CACHE_TTL_SECS: u64 = 3_600;

/// Explanation TTL (seconds)
pub const EXPLANATION_TTL_SECS: u64 = 900;

/// Cache TTL for confident legitimate verdicts (seconds)
pub const TTL_CONFIDENT_LEGITIMATE_SECS: u64 = 86_400;

/// Cache TTL for confident phishing verdicts (seconds)
pub const TTL_CONFIDENT_PHISHING_SECS: u64 = 43_200;

/// Cache TTL for uncertain verdicts (seconds)
pub const TTL_UNCERTAIN_SECS: u64 = 1_800;

/// Synchronous explanation budget (milliseconds)
pub const DEFAULT_SYNC_EXPLANATION_TIMEOUT_MS: u64 = 1_500;

/// Background explanation budget (milliseconds)
pub const DEFAULT_BACKGROUND_EXPLANATION_TIMEOUT_MS: u64 = 5_000;

/// Availability check budget (milliseconds)
pub const DEFAULT_AVAILABILITY_TIMEOUT_MS: u64 = 4_000;

/// Geo analysis budget (milliseconds)
pub const DEFAULT_GEO_TIMEOUT_MS: u64 = 5_000;

/// Classifier inference budget (milliseconds)
pub const DEFAULT_INFERENCE_TIMEOUT_MS: u64 = 2_000;

/// Degeneracy recheck interval (seconds)
pub const DEFAULT_HEALTH_RECHECK_SECS: u64 = 300;

/// Concurrent background explanation jobs
pub const DEFAULT_BACKGROUND_WORKERS: usize = 4;

/// Batch defaults
pub const DEFAULT_BATCH_CONCURRENCY: usize = 20;
pub const DEFAULT_BATCH_MAX_SIZE: usize = 100;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "ShieldSight";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_millis(key: &str, default: u64) -> Duration {
    Duration::from_millis(env_parse(key).unwrap_or(default))
}

/// Get model directory from environment or use default
pub fn get_model_dir() -> String {
    std::env::var("SHIELDSIGHT_MODEL_DIR")
        .unwrap_or_else(|_| DEFAULT_MODEL_DIR.to_string())
}

/// Get model mode from environment or use default
pub fn get_model_mode() -> String {
    std::env::var("SHIELDSIGHT_MODEL_MODE")
        .unwrap_or_else(|_| DEFAULT_MODEL_MODE.to_string())
}

/// Get decision threshold from environment or use default
pub fn get_threshold() -> f32 {
    env_parse("SHIELDSIGHT_THRESHOLD").unwrap_or(DEFAULT_THRESHOLD)
}

/// Serve with the rule engine only (no model file required)
pub fn is_rule_engine_only() -> bool {
    std::env::var("SHIELDSIGHT_RULE_ENGINE_ONLY")
        .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
        .unwrap_or(false)
}

/// Get prediction cache capacity from environment or use default
pub fn get_prediction_cache_size() -> usize {
    env_parse("SHIELDSIGHT_CACHE_SIZE").unwrap_or(DEFAULT_PREDICTION_CACHE_SIZE)
}

pub fn get_sync_explanation_timeout() -> Duration {
    env_millis("SHIELDSIGHT_EXPLAIN_TIMEOUT_MS", DEFAULT_SYNC_EXPLANATION_TIMEOUT_MS)
}

pub fn get_background_explanation_timeout() -> Duration {
    env_millis("SHIELDSIGHT_BACKGROUND_EXPLAIN_TIMEOUT_MS", DEFAULT_BACKGROUND_EXPLANATION_TIMEOUT_MS)
}

pub fn get_availability_timeout() -> Duration {
    env_millis("SHIELDSIGHT_AVAILABILITY_TIMEOUT_MS", DEFAULT_AVAILABILITY_TIMEOUT_MS)
}

pub fn get_geo_timeout() -> Duration {
    env_millis("SHIELDSIGHT_GEO_TIMEOUT_MS", DEFAULT_GEO_TIMEOUT_MS)
}

pub fn get_inference_timeout() -> Duration {
    env_millis("SHIELDSIGHT_INFERENCE_TIMEOUT_MS", DEFAULT_INFERENCE_TIMEOUT_MS)
}

/// Get CPU worker permits from environment or use the number of cores
pub fn get_cpu_workers() -> usize {
    env_parse("SHIELDSIGHT_CPU_WORKERS").unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    })
}

/// Get health recheck interval from environment or use default
pub fn get_health_recheck_interval() -> Duration {
    Duration::from_secs(env_parse("SHIELDSIGHT_HEALTH_RECHECK_SECS").unwrap_or(DEFAULT_HEALTH_RECHECK_SECS))
}
