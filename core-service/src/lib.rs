//! ShieldSight Core - Phishing URL prediction
//!
//! One URL goes in, one explained verdict comes out. See [`Predictor`] for
//! the single-URL pipeline and [`BatchController`] for bounded batch runs.

pub mod constants;
pub mod logic;

pub use logic::config::PredictorConfig;
pub use logic::error::{BatchError, Degradation, ModelError, PredictError};
pub use logic::explain::ExplanationStatus;
pub use logic::predictor::{
    BatchController, BatchReport, ExplainReport, ExplanationMode, PredictOptions, PredictionOutcome,
    PredictionResult, Predictor, PredictorHealth, RiskLevel,
};
