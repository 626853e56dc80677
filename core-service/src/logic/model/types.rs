//! Classifier Types
//!
//! Shared output contract of the trained classifier and the rule engine.

use serde::{Deserialize, Serialize};

use crate::logic::error::ModelError;

// ============================================================================
// LABEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Phishing,
    Legitimate,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phishing => "phishing",
            Self::Legitimate => "legitimate",
        }
    }

    pub fn is_phishing(&self) -> bool {
        matches!(self, Self::Phishing)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// MODEL MODE
// ============================================================================

/// Model artifact variants shipped in the model directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelMode {
    Compatible,
    Enhanced,
    Default,
    Fixed,
}

impl ModelMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compatible" => Some(Self::Compatible),
            "enhanced" => Some(Self::Enhanced),
            "default" => Some(Self::Default),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compatible => "compatible",
            Self::Enhanced => "enhanced",
            Self::Default => "default",
            Self::Fixed => "fixed",
        }
    }

    /// File stem of the ONNX artifact; the sidecar shares it with `.json`
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Compatible => "production_xgboost_compatible",
            Self::Enhanced => "production_xgboost_enhanced",
            Self::Default => "production_xgboost",
            Self::Fixed => "production_xgboost_fixed",
        }
    }
}

impl std::fmt::Display for ModelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CLASS ORDER
// ============================================================================

/// Column order of the raw probability output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassOrder {
    PhishingFirst,
    LegitimateFirst,
}

impl ClassOrder {
    /// Locate the phishing class among the declared class labels
    pub fn detect<S: AsRef<str>>(classes: &[S], phishing_class: &str) -> Result<Self, ModelError> {
        if classes.len() != 2 {
            return Err(ModelError::Metadata(format!("expected 2 classes, got {}", classes.len())));
        }
        if classes[0].as_ref() == phishing_class {
            Ok(Self::PhishingFirst)
        } else if classes[1].as_ref() == phishing_class {
            Ok(Self::LegitimateFirst)
        } else {
            Err(ModelError::Metadata(format!("phishing class '{}' not among classes", phishing_class)))
        }
    }

    /// Reorder raw columns to (phishing, legitimate)
    pub fn normalize(&self, raw: [f32; 2]) -> (f32, f32) {
        match self {
            Self::PhishingFirst => (raw[0], raw[1]),
            Self::LegitimateFirst => (raw[1], raw[0]),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::PhishingFirst => "[phishing, legitimate]",
            Self::LegitimateFirst => "[legitimate, phishing] (columns swapped)",
        }
    }
}

// ============================================================================
// VERDICT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub label: Label,
    pub phishing_probability: f32,
    pub legitimate_probability: f32,
}

impl ClassifierVerdict {
    /// Build from a phishing probability; label is phishing iff p >= threshold
    pub fn from_probability(phishing_probability: f32, threshold: f32) -> Self {
        let p = if phishing_probability.is_finite() { phishing_probability.clamp(0.0, 1.0) } else { 0.5 };
        Self {
            label: if p >= threshold { Label::Phishing } else { Label::Legitimate },
            phishing_probability: p,
            legitimate_probability: 1.0 - p,
        }
    }

    /// Build from an ordered (phishing, legitimate) pair that may not sum to 1
    pub fn from_pair(phishing: f32, legitimate: f32, threshold: f32) -> Self {
        let sum = phishing + legitimate;
        let p = if sum.is_finite() && sum > 0.0 { phishing / sum } else { 0.5 };
        Self::from_probability(p, threshold)
    }

    /// Probability of the predicted label
    pub fn confidence(&self) -> f32 {
        match self.label {
            Label::Phishing => self.phishing_probability,
            Label::Legitimate => self.legitimate_probability,
        }
    }
}

/// Validate a decision threshold
pub fn check_threshold(threshold: f32) -> Result<f32, ModelError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ModelError::InvalidThreshold(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_follows_threshold() {
        for i in 0..=100 {
            let t = i as f32 / 100.0;
            for j in 0..=100 {
                let p = j as f32 / 100.0;
                let v = ClassifierVerdict::from_probability(p, t);
                assert_eq!(v.label.is_phishing(), p >= t, "p={} t={}", p, t);
            }
        }
    }

    #[test]
    fn test_pair_sums_to_one_and_is_idempotent() {
        let v = ClassifierVerdict::from_pair(0.3, 0.9, 0.85);
        assert!((v.phishing_probability + v.legitimate_probability - 1.0).abs() < 1e-6);

        let again = ClassifierVerdict::from_pair(v.phishing_probability, v.legitimate_probability, 0.85);
        assert!((again.phishing_probability - v.phishing_probability).abs() < 1e-6);
        assert_eq!(again.label, v.label);
    }

    #[test]
    fn test_class_order_detection() {
        assert_eq!(ClassOrder::detect(&["0", "1"], "0").unwrap(), ClassOrder::PhishingFirst);
        assert_eq!(ClassOrder::detect(&["1", "0"], "0").unwrap(), ClassOrder::LegitimateFirst);
        assert!(ClassOrder::detect(&["a", "b"], "0").is_err());
        assert!(ClassOrder::detect(&["0"], "0").is_err());
    }

    #[test]
    fn test_class_order_normalize() {
        assert_eq!(ClassOrder::PhishingFirst.normalize([0.9, 0.1]), (0.9, 0.1));
        assert_eq!(ClassOrder::LegitimateFirst.normalize([0.9, 0.1]), (0.1, 0.9));
    }

    #[test]
    fn test_threshold_range() {
        assert!(check_threshold(0.0).is_ok());
        assert!(check_threshold(1.0).is_ok());
        assert_eq!(check_threshold(1.5), Err(ModelError::InvalidThreshold(1.5)));
        assert!(check_threshold(-0.1).is_err());
        assert!(check_threshold(f32::NAN).is_err());
    }

    #[test]
    fn test_mode_parse_round() {
        assert_eq!(ModelMode::parse("Enhanced"), Some(ModelMode::Enhanced));
        assert_eq!(ModelMode::parse("nope"), None);
        assert_eq!(ModelMode::Default.file_stem(), "production_xgboost");
    }
}
