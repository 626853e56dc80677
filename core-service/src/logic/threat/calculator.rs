//! Threat Index Aggregator
//!
//! Stateless: clamp, weight, round, cap, bucket.

use super::rules::*;
use super::types::{ComponentBreakdown, ModelReliability, ThreatAssessment, ThreatInputs, ThreatLevel};

fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

fn one_decimal(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

pub fn level_for(index: u8) -> ThreatLevel {
    match index {
        i if i >= CRITICAL_MIN => ThreatLevel::Critical,
        i if i >= HIGH_MIN => ThreatLevel::High,
        i if i >= MEDIUM_MIN => ThreatLevel::Medium,
        i if i >= LOW_MIN => ThreatLevel::Low,
        _ => ThreatLevel::Minimal,
    }
}

pub fn reliability_for(confidence: f32, heuristic_weight: f32) -> ModelReliability {
    if confidence >= RELIABILITY_HIGH.0 && heuristic_weight >= RELIABILITY_HIGH.1 {
        ModelReliability::High
    } else if confidence >= RELIABILITY_MEDIUM.0 && heuristic_weight >= RELIABILITY_MEDIUM.1 {
        ModelReliability::Medium
    } else {
        ModelReliability::Low
    }
}

pub fn aggregate(inputs: &ThreatInputs) -> ThreatAssessment {
    let confidence = clamp_unit(inputs.classifier_confidence);
    let heuristic = clamp_unit(inputs.heuristic_risk_weight);

    // a legitimate verdict adds nothing from the classifier
    let classifier_score = if inputs.is_phishing { confidence * CLASSIFIER_WEIGHT } else { 0.0 };
    let heuristic_score = heuristic * HEURISTIC_WEIGHT;
    let availability_score = clamp_unit(inputs.availability_risk) * AVAILABILITY_WEIGHT;
    let geo_score = clamp_unit(inputs.geo_risk) * GEO_WEIGHT;
    let proxy_score = clamp_unit(inputs.proxy_risk) * PROXY_WEIGHT;

    let total = classifier_score + heuristic_score + availability_score + geo_score + proxy_score;
    let index = total.round().min(MAX_INDEX as f32) as u8;

    ThreatAssessment {
        index,
        level: level_for(index),
        breakdown: ComponentBreakdown {
            classifier_score: one_decimal(classifier_score),
            heuristic_score: one_decimal(heuristic_score),
            availability_score: one_decimal(availability_score),
            geo_score: one_decimal(geo_score),
            proxy_score: one_decimal(proxy_score),
        },
        model_reliability: reliability_for(confidence, heuristic),
    }
}
