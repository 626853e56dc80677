//! Predictor Types
//!
//! Options going into the orchestrator and the immutable result coming out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::domain::DomainReason;
use crate::logic::error::Degradation;
use crate::logic::explain::{Explanation, ExplanationMethod, FeatureContribution, Timeline};
use crate::logic::model::{Label, ScoringMethod};
use crate::logic::signals::{AvailabilityReport, GeoReport};
use crate::logic::threat::{AttackType, ThreatAssessment};

// ============================================================================
// RISK LEVEL
// ============================================================================

/// User-facing risk label, ordered from safest to most dangerous
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Caution,
    Warning,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_confidence(label: Label, confidence: f32) -> Self {
        match label {
            Label::Phishing => match confidence {
                c if c >= 0.90 => Self::Critical,
                c if c >= 0.75 => Self::High,
                c if c >= 0.60 => Self::Medium,
                _ => Self::Low,
            },
            Label::Legitimate => match confidence {
                c if c >= 0.95 => Self::VeryLow,
                c if c >= 0.85 => Self::Low,
                c if c >= 0.70 => Self::Caution,
                _ => Self::Warning,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Caution => "caution",
            Self::Warning => "warning",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationMode {
    /// Compute inside the request, bounded by the sync budget
    Sync,
    /// Template now, full explanation queued for later fetch by hash
    Deferred,
    /// Template only
    Skip,
}

impl ExplanationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Deferred => "deferred",
            Self::Skip => "skip",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictOptions {
    pub explanation: ExplanationMode,
    pub external_checks: bool,
    /// Overrides the configured threshold
    pub threshold: Option<f32>,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self::full()
    }
}

impl PredictOptions {
    /// Explanation in the request plus availability and geo checks
    pub fn full() -> Self {
        Self {
            explanation: ExplanationMode::Sync,
            external_checks: true,
            threshold: None,
        }
    }

    /// No external checks, explanation deferred
    pub fn fast() -> Self {
        Self {
            explanation: ExplanationMode::Deferred,
            external_checks: false,
            threshold: None,
        }
    }

    /// Batch items: no explanation, external checks on
    pub fn batch() -> Self {
        Self {
            explanation: ExplanationMode::Skip,
            external_checks: true,
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Results for different option sets never share a cache slot
    pub(crate) fn cache_namespace(&self, default_threshold: f32) -> String {
        let mut ns = self.explanation.as_str().to_string();
        if !self.external_checks {
            ns.push_str("-local");
        }
        match self.threshold {
            Some(t) if t != default_threshold => ns.push_str(&format!("@{}", t)),
            _ => {}
        }
        ns
    }
}

// ============================================================================
// STAGES & OVERRIDES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CacheCheck,
    Validate,
    DomainAnalysis,
    FeatureExtract,
    ClassifierInvoke,
    OverrideDecision,
    Explanation,
    AvailabilityAdjust,
    ThreatAggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed_ms: f64,
}

/// Which override rule changed the raw classifier verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideRule {
    /// Classifier is near-certain phishing on a trusted domain
    ClassifierOverridesTrust,
    TrustedDomain,
    Lookalike,
    /// Typosquat that is offline or restricted
    RestrictedLookalike,
    /// Claims HTTPS, fails TLS or is unreachable
    HttpsWithoutTls,
    UnreachableCaution,
}

impl OverrideRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifierOverridesTrust => "classifier_overrides_trust",
            Self::TrustedDomain => "trusted_domain",
            Self::Lookalike => "lookalike",
            Self::RestrictedLookalike => "restricted_lookalike",
            Self::HttpsWithoutTls => "https_without_tls",
            Self::UnreachableCaution => "unreachable_caution",
        }
    }
}

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PredictionMetadata {
    /// Public lookup key for deferred explanations
    pub url_hash: String,
    pub domain_analysis: DomainReason,
    pub domain_trusted: bool,
    pub domain_boost: f32,
    /// Raw classifier confidence before any adjustment
    pub classifier_confidence: f32,
    pub scoring_method: ScoringMethod,
    pub overrides: Vec<OverrideRule>,
    pub degradations: Vec<Degradation>,
    pub explanation_mode: ExplanationMode,
    pub explanation_pending: bool,
    pub model_version: String,
    pub processing_time_ms: f64,
    pub stage_timings: Vec<StageTiming>,
}

/// Terminal artifact of one pipeline run. Never mutated once built.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub url: String,
    pub prediction: Label,
    pub confidence: f32,
    pub phishing_probability: f32,
    pub legitimate_probability: f32,
    pub risk_level: RiskLevel,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    pub availability: Option<AvailabilityReport>,
    pub geo_analysis: Option<GeoReport>,
    pub threat: ThreatAssessment,
    pub attack_type: Option<AttackType>,
    pub metadata: PredictionMetadata,
    pub timestamp: DateTime<Utc>,
}

/// A result plus whether it came straight from the cache
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    #[serde(flatten)]
    pub result: Arc<PredictionResult>,
    pub from_cache: bool,
}

// ============================================================================
// EXPLAIN REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ExplainMetadata {
    pub domain_analysis: DomainReason,
    pub domain_boost: f32,
    pub prediction_metadata: PredictionMetadata,
}

/// Response of a forced synchronous explanation
#[derive(Debug, Clone, Serialize)]
pub struct ExplainReport {
    pub url: String,
    pub prediction: Label,
    pub confidence: f32,
    pub explanation_method: ExplanationMethod,
    pub base_value: f32,
    pub top_features: Vec<FeatureContribution>,
    pub summary: String,
    pub availability: Option<AvailabilityReport>,
    pub metadata: ExplainMetadata,
}

/// Snapshot for health endpoints
#[derive(Debug, Clone, Serialize)]
pub struct PredictorHealth {
    pub model_loaded: bool,
    pub degenerate: bool,
    pub using_fallback: bool,
    pub model_version: String,
    pub cache_size: usize,
    pub cache_capacity: usize,
    pub pending_explanations: usize,
    pub external_checks: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_confidence(Label::Phishing, 0.95), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_confidence(Label::Phishing, 0.80), RiskLevel::High);
        assert_eq!(RiskLevel::from_confidence(Label::Phishing, 0.60), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_confidence(Label::Phishing, 0.30), RiskLevel::Low);
        assert_eq!(RiskLevel::from_confidence(Label::Legitimate, 0.99), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_confidence(Label::Legitimate, 0.90), RiskLevel::Low);
        assert_eq!(RiskLevel::from_confidence(Label::Legitimate, 0.70), RiskLevel::Caution);
        assert_eq!(RiskLevel::from_confidence(Label::Legitimate, 0.50), RiskLevel::Warning);
    }

    #[test]
    fn test_risk_level_order_and_serde() {
        assert!(RiskLevel::VeryLow < RiskLevel::Caution);
        assert!(RiskLevel::Medium < RiskLevel::Critical);
        assert_eq!(serde_json::to_string(&RiskLevel::VeryLow).unwrap(), "\"very_low\"");
    }

    #[test]
    fn test_cache_namespace() {
        assert_eq!(PredictOptions::full().cache_namespace(0.85), "sync");
        assert_eq!(PredictOptions::fast().cache_namespace(0.85), "deferred-local");
        assert_eq!(PredictOptions::batch().with_threshold(0.85).cache_namespace(0.85), "skip");
        assert_eq!(PredictOptions::full().with_threshold(0.5).cache_namespace(0.85), "sync@0.5");
    }
}
