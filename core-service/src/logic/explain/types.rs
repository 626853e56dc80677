use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::model::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationMethod {
    /// Zero one feature at a time against the trained model
    Occlusion,
    /// Triggered rule-engine indicators
    RuleBased,
    /// No contributions; text derived from label and confidence
    Template,
}

impl ExplanationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Occlusion => "occlusion",
            Self::RuleBased => "rule_based",
            Self::Template => "template",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Pushes toward phishing
    Positive,
    /// Pushes toward legitimate
    Negative,
}

impl Impact {
    pub fn of(contribution: f32) -> Self {
        if contribution > 0.0 { Self::Positive } else { Self::Negative }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub value: f32,
    pub contribution: f32,
    pub impact: Impact,
}

impl FeatureContribution {
    pub fn new(feature: impl Into<String>, value: f32, contribution: f32) -> Self {
        Self {
            feature: feature.into(),
            value,
            contribution,
            impact: Impact::of(contribution),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub method: ExplanationMethod,
    /// Phishing score of the unmodified input
    pub base_value: f32,
    /// Sorted by absolute contribution, largest first
    pub top_features: Vec<FeatureContribution>,
}

impl Explanation {
    pub fn template(base_value: f32) -> Self {
        Self {
            method: ExplanationMethod::Template,
            base_value,
            top_features: Vec::new(),
        }
    }

    /// Mean absolute contribution, capped at 1; feeds the threat index
    pub fn risk_weight(&self) -> f32 {
        if self.top_features.is_empty() {
            return 0.0;
        }
        let total: f32 = self.top_features.iter().map(|c| c.contribution.abs()).sum();
        (total / self.top_features.len() as f32).min(1.0)
    }
}

/// Why -> how -> what view of a verdict
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub why_flagged: Vec<String>,
    pub how_exploited: Vec<String>,
    pub what_to_do: Vec<String>,
}

/// A finished deferred explanation, keyed by URL hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredExplanation {
    pub url: String,
    pub url_hash: String,
    pub label: Label,
    pub confidence: f32,
    pub explanation: Explanation,
    pub summary: String,
    pub timeline: Timeline,
    pub computed_at: DateTime<Utc>,
}
