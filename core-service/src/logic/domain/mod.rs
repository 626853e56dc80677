//! Domain Module - Reputation Heuristics
//!
//! Whitelist, subdomain, brand mimicry and typosquat checks that can
//! override the classifier.

pub mod whitelist;
pub mod typosquat;
pub mod analyzer;

pub use analyzer::{normalize_host, DomainAnalyzer, DomainReason, DomainVerdict, STRONG_TRUST};
pub use typosquat::{closest_lookalike, levenshtein};
