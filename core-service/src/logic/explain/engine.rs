//! Explanation Engine
//!
//! Per-feature contributions for a verdict. The trained model is explained
//! by occlusion: each non-zero input is zeroed in turn and the drop in
//! phishing probability is its contribution. The rule engine is explained
//! by the indicators it triggered.

use super::types::{Explanation, ExplanationMethod, FeatureContribution};
use crate::logic::error::ModelError;
use crate::logic::features::FeatureVector;
use crate::logic::model::{Backend, RuleEngine, TrainedModel};

pub const MAX_TOP_FEATURES: usize = 10;

/// Contributions below this are noise
const MIN_CONTRIBUTION: f32 = 1e-4;

pub fn explain(backend: &Backend, features: &FeatureVector) -> Result<Explanation, ModelError> {
    match backend {
        Backend::Trained(model) => occlusion(model, features),
        Backend::RuleBased(rules) => Ok(rule_contributions(rules, features)),
    }
}

pub fn occlusion(model: &TrainedModel, features: &FeatureVector) -> Result<Explanation, ModelError> {
    let row = model.align(features);
    let names = model.model.feature_names();
    let base = model.phishing_probability(&row)?;

    let mut contributions = Vec::new();
    let mut masked = row.clone();
    for (i, &value) in row.iter().enumerate() {
        if value == 0.0 {
            continue;
        }
        masked[i] = 0.0;
        let occluded = model.phishing_probability(&masked)?;
        masked[i] = value;

        let contribution = base - occluded;
        if contribution.abs() >= MIN_CONTRIBUTION {
            let name = names.get(i).map(String::as_str).unwrap_or("unknown");
            contributions.push(FeatureContribution::new(name, value, contribution));
        }
    }

    Ok(Explanation {
        method: ExplanationMethod::Occlusion,
        base_value: base,
        top_features: top_n(contributions),
    })
}

pub fn rule_contributions(rules: &RuleEngine, features: &FeatureVector) -> Explanation {
    let assessment = rules.assess(features);
    let contributions = assessment.indicators.iter()
        .map(|ind| FeatureContribution::new(ind.feature, ind.value, ind.contribution))
        .collect();

    Explanation {
        method: ExplanationMethod::RuleBased,
        base_value: assessment.score,
        top_features: top_n(contributions),
    }
}

fn top_n(mut contributions: Vec<FeatureContribution>) -> Vec<FeatureContribution> {
    contributions.sort_by(|a, b| {
        b.contribution.abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    contributions.truncate(MAX_TOP_FEATURES);
    contributions
}

/// Plain-language reading of a feature pushing toward phishing
pub fn describe_feature(name: &str) -> Option<&'static str> {
    match name {
        "IsHTTPS" => Some("No HTTPS security (missing padlock)"),
        "URLLength" => Some("URL is suspiciously long"),
        "HasIPAddress" => Some("Uses IP address instead of domain"),
        "HasSuspiciousTLD" => Some("Uses free suspicious domain (.tk, .ml, .ga)"),
        "NumSensitiveWords" => Some("Contains phishing keywords (login, bank, secure)"),
        "SubdomainLevel" => Some("Too many subdomains (possible obfuscation)"),
        "HasAt" => Some("Contains @, which hides the real destination"),
        "IsShortURL" => Some("Shortened link hides the real destination"),
        "HasSuspiciousPort" => Some("Runs on a non-standard port"),
        "SpecialCharRatio" => Some("Unusually many special characters"),
        "HasDoubleSlash" => Some("Double slash in path (redirect trick)"),
        _ => None,
    }
}

/// Plain-language reading of a feature pushing toward legitimate
pub fn describe_safe_feature(name: &str) -> Option<&'static str> {
    match name {
        "IsHTTPS" => Some("Uses secure HTTPS connection"),
        "URLLength" => Some("URL length is normal"),
        "HasIPAddress" => Some("Uses proper domain name"),
        "HasSuspiciousTLD" => Some("Uses reputable domain extension"),
        "NumSensitiveWords" => Some("No suspicious keywords detected"),
        "SubdomainLevel" => Some("Normal domain structure"),
        "URLSimilarityIndex" => Some("URL looks unique and original"),
        _ => None,
    }
}

/// `URLLength` -> `URL Length`, `HasIPAddress` -> `Has IP Address`
pub fn display_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if prev.is_lowercase() || (prev.is_uppercase() && next_lower) {
                out.push(' ');
            }
        }
        out.push(if c == '_' { ' ' } else { c });
    }
    out
}
