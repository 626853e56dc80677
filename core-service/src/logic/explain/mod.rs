//! Explain Module - Why a URL got its verdict
//!
//! ## Structure
//! - `types`: Explanation, FeatureContribution, Timeline
//! - `engine`: Occlusion and rule-based contributions
//! - `summary`: Human-readable verdict text
//! - `timeline`: why / how / what view
//! - `store`: Deferred results keyed by URL hash
//! - `scheduler`: Background job queue

pub mod types;
pub mod engine;
pub mod summary;
pub mod timeline;
pub mod store;
pub mod scheduler;

use std::sync::Arc;
use std::time::Duration;

pub use types::{
    Explanation,
    ExplanationMethod,
    FeatureContribution,
    Impact,
    StoredExplanation,
    Timeline,
};
pub use engine::{explain, MAX_TOP_FEATURES};
pub use summary::{generate_summary, template_summary, SummaryInput};
pub use timeline::build_timeline;
pub use store::{ExplanationStatus, ExplanationStore};
pub use scheduler::{ExplanationJob, ExplanationScheduler};

use crate::logic::error::Degradation;
use crate::logic::features::FeatureVector;
use crate::logic::model::Backend;
use crate::logic::pool::CpuPool;

/// Explain on the CPU pool within `budget`; late or failed runs become a
/// degradation for the caller to record.
pub async fn explain_bounded(
    pool: &CpuPool,
    backend: Backend,
    features: Arc<FeatureVector>,
    budget: Duration,
) -> Result<Explanation, Degradation> {
    let task = pool.run(move || engine::explain(&backend, &features));
    match tokio::time::timeout(budget, task).await {
        Ok(Ok(Ok(explanation))) => Ok(explanation),
        Ok(Ok(Err(e))) => Err(Degradation::ExplanationFailed { reason: e.to_string() }),
        Ok(Err(e)) => Err(Degradation::ExplanationFailed { reason: e.to_string() }),
        Err(_) => Err(Degradation::ExplanationTimeout),
    }
}
