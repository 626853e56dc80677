//! Logic Module - Prediction Engines
//!
//! ## Layout
//! - `validate` / `features` - URL gate and lexical feature extraction
//! - `model` - ONNX classifier, rule-engine fallback, backend health
//! - `domain` - Whitelist, typosquat and brand-mimicry analysis
//! - `signals` - Availability and geo checks behind traits
//! - `threat` - Composite threat index and attack typing
//! - `explain` - Contributions, summaries, deferred explanation jobs
//! - `predictor` - Per-URL orchestration and batch runs
//! - `cache` / `pool` - TTL caches and the CPU worker pool

pub mod config;
pub mod error;
pub mod validate;
pub mod pool;
pub mod cache;

pub mod features;
pub mod model;
pub mod domain;
pub mod threat;
pub mod signals;
pub mod explain;
pub mod predictor;

pub use config::PredictorConfig;
pub use error::{BatchError, Degradation, ModelError, PoolError, PredictError, SignalKind};
