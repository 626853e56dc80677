//! Summary Generator
//!
//! Human-readable verdict text: verdict line, risk factors, safety
//! indicators and a recommendation scaled by confidence.

use super::engine::{describe_feature, describe_safe_feature};
use super::types::FeatureContribution;
use crate::logic::domain::DomainVerdict;
use crate::logic::features::{layout::idx, FeatureVector};
use crate::logic::model::Label;

const MAX_RISK_FACTORS: usize = 5;
const MAX_SAFE_FACTORS: usize = 3;
const SUMMARY_TOP_FEATURES: usize = 5;

pub struct SummaryInput<'a> {
    pub label: Label,
    pub confidence: f32,
    pub features: &'a FeatureVector,
    pub contributions: &'a [FeatureContribution],
    pub domain: &'a DomainVerdict,
}

fn percent(confidence: f32) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Text derived from label and confidence only
pub fn template_summary(label: Label, confidence: f32) -> String {
    match label {
        Label::Phishing => format!(
            "WARNING: This URL has been classified as potentially dangerous with {} confidence.",
            percent(confidence)
        ),
        Label::Legitimate => format!("This URL appears safe with {} confidence.", percent(confidence)),
    }
}

pub fn generate_summary(input: &SummaryInput<'_>) -> String {
    let mut risk_factors: Vec<String> = Vec::new();
    let mut safe_factors: Vec<String> = Vec::new();

    for c in input.contributions.iter().take(SUMMARY_TOP_FEATURES) {
        if c.contribution < 0.0 {
            if let Some(text) = describe_safe_feature(&c.feature) {
                safe_factors.push(format!("+ {}", text));
            }
        } else if let Some(text) = describe_feature(&c.feature) {
            risk_factors.push(format!("- {}", text));
        }
    }

    let domain = input.domain;
    if domain.is_trusted && domain.is_strongly_trusted() {
        safe_factors.push(format!(
            "+ Recognized as trusted domain (trust boost: +{:.0}%)",
            domain.trust_adjustment * 100.0
        ));
    }

    let https = input.features.get(idx::IS_HTTPS).unwrap_or(0.0) >= 0.5;
    if https {
        safe_factors.push("+ Uses secure HTTPS connection".to_string());
    } else {
        risk_factors.push("- No HTTPS (insecure connection)".to_string());
    }
    if input.features.get(idx::HAS_IP_ADDRESS).unwrap_or(0.0) > 0.5 {
        risk_factors.push("- Uses IP address instead of domain name".to_string());
    }
    if input.features.get(idx::NUM_SENSITIVE_WORDS).unwrap_or(0.0) > 2.0 {
        risk_factors.push("- Contains phishing-related keywords".to_string());
    }

    risk_factors.dedup();
    safe_factors.dedup();
    risk_factors.truncate(MAX_RISK_FACTORS);
    safe_factors.truncate(MAX_SAFE_FACTORS);

    let phishing = input.label.is_phishing();
    let mut parts: Vec<String> = Vec::new();

    parts.push(if phishing {
        format!("PHISHING DETECTED (Confidence: {})", percent(input.confidence))
    } else {
        format!("LEGITIMATE SITE (Confidence: {})", percent(input.confidence))
    });
    if domain.is_trusted {
        parts.push("Recognized as trusted domain".to_string());
    }

    if !risk_factors.is_empty() {
        parts.push("\nRisk Factors:".to_string());
        parts.extend(risk_factors);
    } else if phishing {
        // phishing without feature evidence means a rule override decided it
        parts.push("\nRisk Factors:".to_string());
        parts.push("- High-risk security policy violation (e.g., brand mimicry or invalid security configuration)".to_string());
    } else {
        parts.push("\nNo significant risk factors detected".to_string());
    }

    if !safe_factors.is_empty() {
        parts.push("\nSafety Indicators:".to_string());
        parts.extend(safe_factors);
    }

    let c = input.confidence;
    if phishing {
        if c >= 0.90 {
            parts.push("\nRecommendation:".to_string());
            parts.push("DO NOT proceed. This is highly likely to be a phishing site designed to steal your credentials.".to_string());
        } else if c >= 0.75 {
            parts.push("\nRecommendation:".to_string());
            parts.push("Extreme caution advised. This site exhibits multiple phishing characteristics.".to_string());
        }
    } else if c >= 0.95 {
        parts.push("\nRecommendation:".to_string());
        parts.push("Appears safe. Normal browsing precautions apply.".to_string());
    } else {
        parts.push("\nRecommendation:".to_string());
        parts.push("Probably safe, but remain vigilant.".to_string());
    }

    if c < 0.7 {
        parts.push("\nNote: Low confidence prediction. Verify through other means.".to_string());
    }
    if domain.is_trusted && phishing {
        parts.push("\nImportant: Despite being a known domain, this specific URL shows phishing characteristics.".to_string());
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::domain::DomainAnalyzer;
    use crate::logic::features::extract;

    #[test]
    fn test_template_summary() {
        assert_eq!(
            template_summary(Label::Legitimate, 0.9512),
            "This URL appears safe with 95.1% confidence."
        );
        assert!(template_summary(Label::Phishing, 0.5).starts_with("WARNING"));
    }

    #[test]
    fn test_trusted_legitimate_summary() {
        let domain = DomainAnalyzer::default().analyze("https://www.google.com");
        let features = extract("https://www.google.com");
        let text = generate_summary(&SummaryInput {
            label: Label::Legitimate,
            confidence: 0.97,
            features: &features,
            contributions: &[],
            domain: &domain,
        });
        assert!(text.starts_with("LEGITIMATE SITE (Confidence: 97.0%)"));
        assert!(text.contains("trust boost: +30%"));
        assert!(text.contains("Appears safe"));
        assert!(!text.contains("Risk Factors"));
    }

    #[test]
    fn test_override_phishing_summary() {
        let domain = DomainAnalyzer::default().analyze("https://accounts-google-secure.com");
        let features = extract("https://accounts-google-secure.com");
        let text = generate_summary(&SummaryInput {
            label: Label::Phishing,
            confidence: 0.95,
            features: &features,
            contributions: &[],
            domain: &domain,
        });
        assert!(text.contains("security policy violation"));
        assert!(text.contains("DO NOT proceed"));
    }

    #[test]
    fn test_contributions_become_factors() {
        let domain = DomainAnalyzer::default().analyze("http://203.0.113.9/login");
        let features = extract("http://203.0.113.9/login");
        let contributions = vec![
            FeatureContribution::new("HasIPAddress", 1.0, 0.3),
            FeatureContribution::new("URLLength", 24.0, -0.1),
        ];
        let text = generate_summary(&SummaryInput {
            label: Label::Phishing,
            confidence: 0.8,
            features: &features,
            contributions: &contributions,
            domain: &domain,
        });
        assert!(text.contains("- Uses IP address instead of domain"));
        assert!(text.contains("+ URL length is normal"));
        assert!(text.contains("Extreme caution"));
    }
}
