//! Override Decision
//!
//! Combines the raw classifier verdict with the domain verdict, and later
//! with the availability report. Pure functions; the orchestrator owns the
//! sequencing.
//!
//! Domain phase, first applicable wins:
//! - a. strongly trusted, classifier near-certain phishing -> phishing
//! - b. strongly trusted -> legitimate
//! - c. typosquat or brand mimicry -> phishing
//! - d. classifier verdict
//!
//! Availability phase, first applicable wins:
//! - f. typosquat that is offline or restricted -> critical phishing
//! - e. HTTPS URL with failing TLS or no response, untrusted -> phishing,
//!   confidence held in [0.65, 0.70]
//! - g. untrusted "legitimate" that is offline or restricted -> caution

use super::types::{OverrideRule, RiskLevel};
use crate::logic::domain::DomainVerdict;
use crate::logic::model::{ClassifierVerdict, Label};
use crate::logic::signals::AvailabilityReport;

const OVERRIDE_PHISHING_MIN: f32 = 0.95;
const OVERRIDE_LEGITIMATE_MAX: f32 = 0.05;
const TRUSTED_CONFIDENCE_FLOOR: f32 = 0.8;
const LOOKALIKE_CONFIDENCE_FLOOR: f32 = 0.95;
const RESTRICTED_LOOKALIKE_CONFIDENCE: f32 = 0.99;
const HTTPS_MISMATCH_CONFIDENCE_FLOOR: f32 = 0.65;
const UNREACHABLE_CONFIDENCE_CAP: f32 = 0.70;

/// Move a confidence toward 1 (positive adjustment) or 0 (negative)
pub fn adjust_confidence(confidence: f32, adjustment: f32) -> f32 {
    if adjustment > 0.0 {
        (confidence + adjustment * (1.0 - confidence)).min(0.99)
    } else if adjustment < 0.0 {
        (confidence * (1.0 + adjustment)).max(0.01)
    } else {
        confidence
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub label: Label,
    pub confidence: f32,
    pub risk_level: RiskLevel,
    pub applied: Vec<OverrideRule>,
    /// Replaces the generated summary when an availability rule fired
    pub summary_override: Option<String>,
}

impl Decision {
    fn new(label: Label, confidence: f32) -> Self {
        Self {
            label,
            confidence,
            risk_level: RiskLevel::from_confidence(label, confidence),
            applied: Vec::new(),
            summary_override: None,
        }
    }

    fn with_rule(mut self, rule: OverrideRule) -> Self {
        self.applied.push(rule);
        self
    }
}

/// Domain phase
pub fn decide(verdict: &ClassifierVerdict, domain: &DomainVerdict) -> Decision {
    let raw_confidence = verdict.phishing_probability.max(verdict.legitimate_probability);
    let adjusted = adjust_confidence(raw_confidence, domain.trust_adjustment);

    if domain.is_trusted && domain.is_strongly_trusted() {
        if verdict.phishing_probability > OVERRIDE_PHISHING_MIN
            && verdict.legitimate_probability < OVERRIDE_LEGITIMATE_MAX
        {
            log::info!("Whitelist overridden by classifier ({}), p={:.3}", domain.reason, verdict.phishing_probability);
            return Decision::new(Label::Phishing, verdict.phishing_probability)
                .with_rule(OverrideRule::ClassifierOverridesTrust);
        }

        let mut decision = Decision::new(Label::Legitimate, adjusted.max(TRUSTED_CONFIDENCE_FLOOR))
            .with_rule(OverrideRule::TrustedDomain);
        decision.risk_level = decision.risk_level.min(RiskLevel::Low);
        return decision;
    }

    if domain.reason.is_lookalike() {
        log::warn!("Lookalike/mimicry override: {}", domain.reason);
        return Decision::new(Label::Phishing, adjusted.max(LOOKALIKE_CONFIDENCE_FLOOR))
            .with_rule(OverrideRule::Lookalike);
    }

    Decision::new(verdict.label, adjusted)
}

/// Availability phase. `claims_https` comes from the feature vector.
pub fn apply_availability(
    decision: &mut Decision,
    domain: &DomainVerdict,
    claims_https: bool,
    availability: &AvailabilityReport,
) {
    let unreachable = availability.is_unreachable();

    if domain.reason.is_typosquat() && unreachable {
        decision.label = Label::Phishing;
        decision.confidence = RESTRICTED_LOOKALIKE_CONFIDENCE;
        decision.risk_level = RiskLevel::Critical;
        decision.applied.push(OverrideRule::RestrictedLookalike);
        decision.summary_override = Some(
            "CRITICAL: This URL is a lookalike (typo-squatting) and is currently restricted or offline. \
             This is a very strong indicator of a malicious phishing landing page."
                .to_string(),
        );
        log::warn!("Restricted lookalike override ({})", domain.reason);
        return;
    }

    if decision.label != Label::Legitimate || domain.is_trusted {
        return;
    }

    if claims_https && (availability.ssl_invalid() || availability.explicitly_inaccessible()) {
        decision.label = Label::Phishing;
        // a flipped verdict never carries the old legitimate certainty
        decision.confidence = decision.confidence
            .min(UNREACHABLE_CONFIDENCE_CAP)
            .max(HTTPS_MISMATCH_CONFIDENCE_FLOOR);
        decision.risk_level = RiskLevel::Medium;
        decision.applied.push(OverrideRule::HttpsWithoutTls);
        decision.summary_override = Some(
            "Suspicious: This site appears to use HTTPS but has invalid security certificates or is offline. \
             This is a common pattern for abandoned phishing sites."
                .to_string(),
        );
        log::warn!("Signal override: HTTPS claimed but TLS invalid or site unreachable");
        return;
    }

    if unreachable && decision.risk_level <= RiskLevel::Low {
        decision.risk_level = RiskLevel::Caution;
        decision.confidence = decision.confidence.min(UNREACHABLE_CONFIDENCE_CAP);
        decision.applied.push(OverrideRule::UnreachableCaution);
        decision.summary_override = Some(format!(
            "Caution: This site is currently {}. While it shares characteristics with legitimate sites, \
             we cannot verify its current content and its restricted status is unusual for a public site.",
            availability.describe_unreachable()
        ));
        log::info!("Downgraded risk level to caution ({})", availability.describe_unreachable());
    }
}
