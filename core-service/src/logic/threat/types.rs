//! Threat Types
//!
//! Data structures only, no logic.

use serde::{Deserialize, Serialize};

// ============================================================================
// THREAT LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Minimal => "MINIMAL",
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Critical => "CRITICAL",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ThreatLevel::Minimal => "#10b981",
            ThreatLevel::Low => "#84cc16",
            ThreatLevel::Medium => "#f59e0b",
            ThreatLevel::High => "#f97316",
            ThreatLevel::Critical => "#ef4444",
        }
    }
}

impl std::fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much the classifier confidence can be leaned on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelReliability {
    Low,
    Medium,
    High,
}

// ============================================================================
// INPUTS & OUTPUT
// ============================================================================

/// Everything the aggregator consumes; risk scalars are clamped to [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThreatInputs {
    pub classifier_confidence: f32,
    pub heuristic_risk_weight: f32,
    pub availability_risk: f32,
    pub geo_risk: f32,
    pub proxy_risk: f32,
    pub is_phishing: bool,
}

/// Per-component points, one decimal
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub classifier_score: f32,
    pub heuristic_score: f32,
    pub availability_score: f32,
    pub geo_score: f32,
    pub proxy_score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    /// 0 - 100
    pub index: u8,
    pub level: ThreatLevel,
    pub breakdown: ComponentBreakdown,
    pub model_reliability: ModelReliability,
}
