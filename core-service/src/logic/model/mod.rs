//! Model Module - Phishing Classifier
//!
//! Trained classifier (ONNX), the rule-based fallback engine and the
//! backend that picks between them.

pub mod types;
pub mod inference;
pub mod fallback;
pub mod backend;

// Re-export common types
pub use types::{check_threshold, ClassOrder, ClassifierVerdict, Label, ModelMode};
pub use inference::{ModelMetadata, OnnxModel, ProbabilityModel};
pub use fallback::{JitterSource, NoJitter, RuleAssessment, RuleEngine, SeededJitter, UniformJitter};
pub use backend::{Backend, ClassifierBackend, ModelInfo, Scored, Scorer, ScoringMethod, TrainedModel};
