//! Explainability Timeline
//!
//! why_flagged -> how_exploited -> what_to_do, from the top contributions.

use super::engine::{describe_feature, display_name};
use super::types::{FeatureContribution, Timeline};
use crate::logic::model::Label;

const TIMELINE_FEATURES: usize = 3;

fn attack_vector(feature: &str) -> Option<&'static str> {
    let lowered = feature.to_ascii_lowercase();
    if lowered.contains("tld") {
        Some("Phishers use cheap/suspicious TLDs to avoid detection")
    } else if lowered.contains("https") {
        Some("Missing HTTPS makes it easier to intercept data")
    } else if lowered.contains("length") {
        Some("Long URLs with obfuscation hide malicious intent")
    } else if lowered.contains("ipaddress") {
        Some("Raw IP addresses avoid domain reputation checks")
    } else if lowered.contains("sensitive") {
        Some("Words like login or verify pressure victims into entering credentials")
    } else {
        None
    }
}

fn actions(label: Label) -> Vec<String> {
    let items: &[&str] = match label {
        Label::Phishing => &[
            "DO NOT click this link",
            "DO NOT enter credentials or personal information",
            "Report this to your security team",
            "Delete the email/message containing this link",
        ],
        Label::Legitimate => &[
            "URL appears safe to visit",
            "Still verify the domain matches your expectation",
            "Ensure HTTPS connection before entering sensitive data",
        ],
    };
    items.iter().map(|s| s.to_string()).collect()
}

pub fn build_timeline(label: Label, contributions: &[FeatureContribution]) -> Timeline {
    let mut top: Vec<&FeatureContribution> = contributions.iter().collect();
    top.sort_by(|a, b| {
        b.contribution.abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    top.truncate(TIMELINE_FEATURES);

    let why_flagged = top.iter()
        .filter(|c| c.contribution > 0.0)
        .map(|c| match describe_feature(&c.feature) {
            Some(text) => format!("{}: {}", display_name(&c.feature), text),
            None => format!("{}: Value: {}", display_name(&c.feature), c.value),
        })
        .collect();

    let mut how_exploited: Vec<String> = Vec::new();
    for c in &top {
        if let Some(v) = attack_vector(&c.feature) {
            if !how_exploited.iter().any(|h| h == v) {
                how_exploited.push(v.to_string());
            }
        }
    }

    Timeline {
        why_flagged,
        how_exploited,
        what_to_do: actions(label),
    }
}
