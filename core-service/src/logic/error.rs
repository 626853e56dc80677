//! Error Types
//!
//! Only `PredictError` ever reaches a caller. Everything else the pipeline
//! recovers from is recorded as a `Degradation` on the result metadata.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller-visible prediction failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictError {
    /// Malformed, empty, oversized or injection-bearing URL
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No classifier (or rule engine) is loaded
    #[error("prediction service unavailable: model not loaded")]
    ServiceUnavailable,
}

/// Classifier backend failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("threshold {0} outside [0, 1]")]
    InvalidThreshold(f32),

    #[error("model not found: {0}")]
    NotFound(String),

    #[error("failed to load model: {0}")]
    Load(String),

    #[error("invalid model metadata: {0}")]
    Metadata(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model not loaded")]
    Unavailable,
}

/// Batch admission failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BatchError {
    #[error("batch of {received} URLs exceeds the limit of {limit}")]
    TooLarge { received: usize, limit: usize },
}

/// CPU pool failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed,

    #[error("blocking task failed: {0}")]
    Panicked(String),
}

/// External signal kinds, used to tag timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Availability,
    Geo,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Availability => "availability",
            Self::Geo => "geo",
        }
    }
}

/// A failure the pipeline recovered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Classifier output is constant; rule engine served instead
    DegenerateModel,
    /// Inference errored or timed out; rule engine served instead
    InferenceFailed { reason: String },
    /// Sync explanation missed its budget; template used
    ExplanationTimeout,
    /// Explanation computation failed; template used
    ExplanationFailed { reason: String },
    /// External signal missed its budget; safe default used
    SignalTimeout { signal: SignalKind },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateModel => write!(f, "degenerate model, rule engine active"),
            Self::InferenceFailed { reason } => write!(f, "inference failed: {}", reason),
            Self::ExplanationTimeout => write!(f, "explanation timed out"),
            Self::ExplanationFailed { reason } => write!(f, "explanation failed: {}", reason),
            Self::SignalTimeout { signal } => write!(f, "{} signal timed out", signal.as_str()),
        }
    }
}
