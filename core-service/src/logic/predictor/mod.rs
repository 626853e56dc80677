//! Predictor Module - URL in, verdict out
//!
//! ## Structure
//! - `types`: Options, PredictionResult, RiskLevel
//! - `overrides`: Domain and availability override rules
//! - `orchestrator`: The per-URL pipeline and its caches
//! - `batch`: Bounded-concurrency multi-URL runs

pub mod types;
pub mod overrides;
pub mod orchestrator;
pub mod batch;

mod tests;

pub use types::{
    ExplainMetadata,
    ExplainReport,
    ExplanationMode,
    OverrideRule,
    PredictOptions,
    PredictionMetadata,
    PredictionOutcome,
    PredictionResult,
    PredictorHealth,
    RiskLevel,
    Stage,
    StageTiming,
};
pub use overrides::{adjust_confidence, apply_availability, decide, Decision};
pub use orchestrator::{cache_ttl, url_hash, Predictor};
pub use batch::{BatchController, BatchItemError, BatchReport};
