//! Prediction request/response models

use serde::{Deserialize, Serialize};
use validator::Validate;

use shieldsight_core::logic::explain::{Explanation, StoredExplanation, Timeline};
use shieldsight_core::logic::model::Label;
use shieldsight_core::ExplanationStatus;

#[derive(Debug, Deserialize, Validate)]
pub struct UrlInput {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BatchInput {
    #[validate(length(min = 1))]
    pub urls: Vec<String>,
}

/// Query toggles on `POST /predict`
#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    #[serde(default = "default_true")]
    pub include_explanation: bool,
    #[serde(default)]
    pub skip_external_checks: bool,
}

impl Default for PredictQuery {
    fn default() -> Self {
        Self {
            include_explanation: true,
            skip_external_checks: false,
        }
    }
}

/// Query toggles on `POST /predict/batch`
#[derive(Debug, Deserialize, Default)]
pub struct BatchQuery {
    #[serde(default)]
    pub include_explanation: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ExplanationLookup {
    pub status: &'static str,
    pub url_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Label>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl ExplanationLookup {
    pub fn from_status(url_hash: &str, status: &ExplanationStatus) -> Self {
        let mut lookup = Self {
            status: status.as_str(),
            url_hash: url_hash.to_string(),
            url: None,
            prediction: None,
            explanation: None,
            summary: None,
            timeline: None,
            computed_at: None,
            message: None,
        };
        match status {
            ExplanationStatus::Ready(stored) => lookup.fill(stored),
            ExplanationStatus::Pending => {
                lookup.message = Some("Explanation is being computed. Try again in a few seconds.");
            }
            ExplanationStatus::Unknown => {
                lookup.message = Some("No explanation scheduled for this hash, or it has expired.");
            }
        }
        lookup
    }

    fn fill(&mut self, stored: &StoredExplanation) {
        self.url = Some(stored.url.clone());
        self.prediction = Some(stored.label);
        self.explanation = Some(stored.explanation.clone());
        self.summary = Some(stored.summary.clone());
        self.timeline = Some(stored.timeline.clone());
        self.computed_at = Some(stored.computed_at.timestamp());
    }
}
