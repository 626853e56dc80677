//! Threat Module
//!
//! Collapses classifier confidence and independent risk signals into one
//! 0-100 threat index, and names the attack pattern of phishing URLs.
//!
//! ## Structure
//! - `types`: ThreatLevel, ThreatInputs, ThreatAssessment
//! - `rules`: Weights and level cut-offs
//! - `calculator`: `aggregate`
//! - `attack`: Keyword-based attack type

pub mod types;
pub mod rules;
pub mod calculator;
pub mod attack;

pub use types::{
    ThreatLevel,
    ModelReliability,
    ThreatInputs,
    ComponentBreakdown,
    ThreatAssessment,
};

pub use calculator::{aggregate, level_for, reliability_for};
pub use attack::{classify_attack, AttackType};
