//! Rule-Based Fallback Engine
//!
//! Deterministic scorer with the same output contract as the trained
//! classifier. Serves whenever the model is degenerate or inference fails.
//!
//! Scoring passes:
//! 1. Weighted indicator checks accumulate a phishing score
//! 2. Legitimacy signals shrink it multiplicatively
//! 3. The indicator count pins the score into a categorical band
//! 4. Clamp to [0.01, 0.99] plus a small display jitter

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::types::{check_threshold, ClassifierVerdict};
use crate::logic::error::ModelError;
use crate::logic::features::layout::idx;
use crate::logic::features::FeatureVector;

// ============================================================================
// RULE TABLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Trigger {
    /// Fires when the value is below the threshold
    Absent,
    /// Fires when the value reaches the threshold
    Present,
    /// Fires above the threshold, scaled by the excess up to `cap`
    Scaled { cap: f32 },
}

struct Rule {
    feature: usize,
    name: &'static str,
    weight: f32,
    threshold: f32,
    trigger: Trigger,
}

const RULES: &[Rule] = &[
    Rule { feature: idx::IS_HTTPS, name: "No HTTPS", weight: 0.35, threshold: 0.5, trigger: Trigger::Absent },
    Rule { feature: idx::URL_LENGTH, name: "Long URL", weight: 0.30, threshold: 60.0, trigger: Trigger::Scaled { cap: 2.0 } },
    Rule { feature: idx::HAS_IP_ADDRESS, name: "IP Address", weight: 0.25, threshold: 0.5, trigger: Trigger::Present },
    Rule { feature: idx::NUM_SENSITIVE_WORDS, name: "Phishing Keywords", weight: 0.25, threshold: 0.5, trigger: Trigger::Present },
    Rule { feature: idx::HAS_SUSPICIOUS_TLD, name: "Suspicious TLD", weight: 0.20, threshold: 0.5, trigger: Trigger::Present },
    Rule { feature: idx::SPECIAL_CHAR_RATIO, name: "Many Special Chars", weight: 0.15, threshold: 0.30, trigger: Trigger::Scaled { cap: 3.0 } },
    Rule { feature: idx::SUBDOMAIN_LEVEL, name: "Many Subdomains", weight: 0.10, threshold: 3.0, trigger: Trigger::Scaled { cap: 3.0 } },
    Rule { feature: idx::HAS_AT, name: "Contains @", weight: 0.15, threshold: 0.5, trigger: Trigger::Present },
    Rule { feature: idx::IS_SHORT_URL, name: "Shortened URL", weight: 0.10, threshold: 0.5, trigger: Trigger::Present },
    Rule { feature: idx::HAS_DOUBLE_SLASH, name: "Double Slash", weight: 0.05, threshold: 0.5, trigger: Trigger::Present },
    Rule { feature: idx::HAS_SUSPICIOUS_PORT, name: "Non-standard Port", weight: 0.10, threshold: 0.5, trigger: Trigger::Present },
];

const SCORE_FLOOR: f32 = 0.01;
const SCORE_CEIL: f32 = 0.99;
pub const JITTER_AMPLITUDE: f32 = 0.01;

// ============================================================================
// JITTER
// ============================================================================

/// Source of the display jitter added to rule scores
pub trait JitterSource: Send + Sync {
    /// Sample in [-JITTER_AMPLITUDE, JITTER_AMPLITUDE]
    fn sample(&self) -> f32;
}

/// Thread-local RNG, uniform
#[derive(Debug, Default)]
pub struct UniformJitter;

impl JitterSource for UniformJitter {
    fn sample(&self) -> f32 {
        rand::thread_rng().gen_range(-JITTER_AMPLITUDE..=JITTER_AMPLITUDE)
    }
}

/// No jitter at all
#[derive(Debug, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn sample(&self) -> f32 {
        0.0
    }
}

/// Reproducible jitter for tests and replays
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> f32 {
        self.rng.lock().gen_range(-JITTER_AMPLITUDE..=JITTER_AMPLITUDE)
    }
}

// ============================================================================
// ASSESSMENT
// ============================================================================

/// One triggered indicator and what it added to the score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    pub feature: &'static str,
    pub name: &'static str,
    pub value: f32,
    pub contribution: f32,
}

/// Jitter-free result of the rule passes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleAssessment {
    pub score: f32,
    pub indicators: Vec<Indicator>,
    pub legitimacy_signals: usize,
}

pub struct RuleEngine {
    jitter: Arc<dyn JitterSource>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(Arc::new(UniformJitter))
    }
}

impl RuleEngine {
    pub fn new(jitter: Arc<dyn JitterSource>) -> Self {
        Self { jitter }
    }

    /// Engine without jitter (fully deterministic)
    pub fn deterministic() -> Self {
        Self::new(Arc::new(NoJitter))
    }

    pub fn assess(&self, features: &FeatureVector) -> RuleAssessment {
        let value = |i: usize| features.get(i).unwrap_or(0.0);

        let mut score = 0.0f32;
        let mut indicators = Vec::new();

        for rule in RULES {
            let v = value(rule.feature);
            let contribution = match rule.trigger {
                Trigger::Absent if v < rule.threshold => rule.weight,
                Trigger::Present if v >= rule.threshold => rule.weight,
                Trigger::Scaled { cap } if v > rule.threshold => {
                    let excess = ((v - rule.threshold) / rule.threshold).min(cap);
                    rule.weight * (0.5 + excess * 0.5)
                }
                _ => continue,
            };
            score += contribution;
            indicators.push(Indicator {
                feature: crate::logic::features::feature_name(rule.feature).unwrap_or("unknown"),
                name: rule.name,
                value: v,
                contribution,
            });
        }

        let has_https = value(idx::IS_HTTPS) >= 0.5;
        let short_url = value(idx::URL_LENGTH) < 30.0;
        let no_ip = value(idx::HAS_IP_ADDRESS) < 0.5;
        let no_sensitive = value(idx::NUM_SENSITIVE_WORDS) < 0.5;

        let mut reduction = 1.0f32;
        let mut legitimacy_signals = 0;
        for (present, factor) in [(has_https, 0.6), (short_url, 0.8), (no_ip, 0.9), (no_sensitive, 0.9)] {
            if present {
                reduction *= factor;
                legitimacy_signals += 1;
            }
        }
        score *= reduction;

        score = match indicators.len() {
            n if n >= 4 => score.max(0.95),
            3 => score.max(0.90),
            2 => score.max(0.86),
            1 => score.max(0.45),
            _ => match legitimacy_signals {
                n if n >= 3 => score.min(0.10),
                2 => score.min(0.20),
                1 => score.min(0.30),
                _ => 0.40,
            },
        };

        RuleAssessment {
            score: score.clamp(SCORE_FLOOR, SCORE_CEIL),
            indicators,
            legitimacy_signals,
        }
    }

    pub fn score(&self, features: &FeatureVector, threshold: f32) -> Result<ClassifierVerdict, ModelError> {
        let threshold = check_threshold(threshold)?;
        let assessment = self.assess(features);
        let score = self.jittered(assessment.score, threshold);

        log::debug!(
            "Rule-based score {:.3} ({} indicators, {} legitimacy signals)",
            score,
            assessment.indicators.len(),
            assessment.legitimacy_signals
        );

        Ok(ClassifierVerdict::from_probability(score, threshold))
    }

    /// Jitter never moves a score across the threshold
    fn jittered(&self, base: f32, threshold: f32) -> f32 {
        let noise = self.jitter.sample().clamp(-JITTER_AMPLITUDE, JITTER_AMPLITUDE);
        let candidate = (base + noise).clamp(SCORE_FLOOR, SCORE_CEIL);
        if (candidate >= threshold) == (base >= threshold) {
            candidate
        } else {
            base
        }
    }
}
