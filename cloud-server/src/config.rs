//! Configuration module

use std::env;

use shieldsight_core::constants::{DEFAULT_BATCH_CONCURRENCY, DEFAULT_BATCH_MAX_SIZE};
use shieldsight_core::PredictorConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Max in-flight predictions per batch request
    pub batch_concurrency: usize,

    /// Max URLs per batch request
    pub batch_max_size: usize,

    /// Availability and geo checks; off forces every request local
    pub external_checks_enabled: bool,

    pub predictor: PredictorConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            batch_concurrency: env::var("BATCH_CONCURRENCY")
                .ok()
                .and_then(|c| c.parse().ok())
                .filter(|c: &usize| *c > 0)
                .unwrap_or(DEFAULT_BATCH_CONCURRENCY),

            batch_max_size: env::var("BATCH_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BATCH_MAX_SIZE),

            external_checks_enabled: env::var("EXTERNAL_CHECKS_ENABLED")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(true),

            predictor: PredictorConfig::from_env(),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
