//! Threat Index Rules
//!
//! Component weights and level cut-offs. Weights sum to 100.

pub const CLASSIFIER_WEIGHT: f32 = 40.0;
pub const HEURISTIC_WEIGHT: f32 = 25.0;
pub const AVAILABILITY_WEIGHT: f32 = 15.0;
pub const GEO_WEIGHT: f32 = 10.0;
pub const PROXY_WEIGHT: f32 = 10.0;

pub const MAX_INDEX: u8 = 100;

pub const CRITICAL_MIN: u8 = 80;
pub const HIGH_MIN: u8 = 60;
pub const MEDIUM_MIN: u8 = 40;
pub const LOW_MIN: u8 = 20;

/// (confidence, heuristic weight) minimums
pub const RELIABILITY_HIGH: (f32, f32) = (0.9, 0.7);
pub const RELIABILITY_MEDIUM: (f32, f32) = (0.7, 0.5);
