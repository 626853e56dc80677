//! Feature Layout - Centralized Feature Definition
//!
//! **CRITICAL: This file controls the URL feature schema**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Trained models declare their own feature names in the metadata sidecar;
//! the vector is aligned to that list at inference time.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Feature names in exact order they appear in the vector
pub const FEATURE_LAYOUT: &[&str] = &[
    // === URL basics (0-10) ===
    "URLLength",             // 0: characters in the full URL
    "DomainLength",          // 1: characters in the host
    "IsHTTPS",               // 2: scheme is https
    "NumDots",               // 3
    "NumHyphens",            // 4
    "NumUnderscores",        // 5
    "NumPercent",            // 6
    "NumAmpersand",          // 7
    "NumHash",               // 8
    "NumQueryComponents",    // 9: `&`-separated query parts
    "NumNumericChars",       // 10

    // === Domain (11-13) ===
    "SubdomainLevel",        // 11: dots in the host
    "HasIPAddress",          // 12: dotted-quad host
    "HasAt",                 // 13: `@` anywhere in the URL

    // === Path (14-16) ===
    "PathLength",            // 14
    "LargestLineLength",     // 15: longest path segment
    "LineOfCode",            // 16: non-empty path segments

    // === Suspicious patterns (17-19) ===
    "NumSensitiveWords",     // 17: phishing keyword hits
    "HasDoubleSlash",        // 18: `//` inside the path
    "HasSuspiciousTLD",      // 19

    // === Page references, reserved (20-22) ===
    "NoOfExternalRef",       // 20
    "NoOfSelfRef",           // 21
    "URLSimilarityIndex",    // 22

    // === Character distribution (23-25) ===
    "LetterRatio",           // 23
    "DigitRatio",            // 24
    "SpecialCharRatio",      // 25: non-alphanumeric share

    // === Additional (26-31) ===
    "NumSlashes",            // 26
    "NumEquals",             // 27
    "NumQuestionMarks",      // 28
    "DomainEntropy",         // 29: Shannon entropy of the host
    "IsShortURL",            // 30: known shortener host
    "HasSuspiciousPort",     // 31
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 32;

/// Indices used by the rule engine and the extractor
pub mod idx {
    pub const URL_LENGTH: usize = 0;
    pub const DOMAIN_LENGTH: usize = 1;
    pub const IS_HTTPS: usize = 2;
    pub const NUM_DOTS: usize = 3;
    pub const NUM_HYPHENS: usize = 4;
    pub const NUM_UNDERSCORES: usize = 5;
    pub const NUM_PERCENT: usize = 6;
    pub const NUM_AMPERSAND: usize = 7;
    pub const NUM_HASH: usize = 8;
    pub const NUM_QUERY_COMPONENTS: usize = 9;
    pub const NUM_NUMERIC_CHARS: usize = 10;
    pub const SUBDOMAIN_LEVEL: usize = 11;
    pub const HAS_IP_ADDRESS: usize = 12;
    pub const HAS_AT: usize = 13;
    pub const PATH_LENGTH: usize = 14;
    pub const LARGEST_LINE_LENGTH: usize = 15;
    pub const LINE_OF_CODE: usize = 16;
    pub const NUM_SENSITIVE_WORDS: usize = 17;
    pub const HAS_DOUBLE_SLASH: usize = 18;
    pub const HAS_SUSPICIOUS_TLD: usize = 19;
    pub const LETTER_RATIO: usize = 23;
    pub const DIGIT_RATIO: usize = 24;
    pub const SPECIAL_CHAR_RATIO: usize = 25;
    pub const NUM_SLASHES: usize = 26;
    pub const NUM_EQUALS: usize = 27;
    pub const NUM_QUESTION_MARKS: usize = 28;
    pub const DOMAIN_ENTROPY: usize = 29;
    pub const IS_SHORT_URL: usize = 30;
    pub const HAS_SUSPICIOUS_PORT: usize = 31;
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches against model metadata
pub fn compute_layout_hash() -> u32 {
    hash_names(FEATURE_VERSION, FEATURE_LAYOUT.iter().copied())
}

/// Hash an arbitrary ordered name list the same way as the built-in layout
pub fn hash_names<'a>(version: u8, names: impl IntoIterator<Item = &'a str>) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[version]);
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_layout_hash_stable_and_order_sensitive() {
        assert_eq!(compute_layout_hash(), compute_layout_hash());
        assert_ne!(layout_hash(), 0);

        let mut reversed: Vec<&str> = FEATURE_LAYOUT.to_vec();
        reversed.reverse();
        assert_ne!(hash_names(FEATURE_VERSION, reversed), layout_hash());
    }

    #[test]
    fn test_index_constants_match_names() {
        assert_eq!(feature_index("URLLength"), Some(idx::URL_LENGTH));
        assert_eq!(feature_index("IsHTTPS"), Some(idx::IS_HTTPS));
        assert_eq!(feature_index("SpecialCharRatio"), Some(idx::SPECIAL_CHAR_RATIO));
        assert_eq!(feature_index("HasSuspiciousPort"), Some(idx::HAS_SUSPICIOUS_PORT));
        assert_eq!(feature_name(idx::NUM_SENSITIVE_WORDS), Some("NumSensitiveWords"));
        assert_eq!(feature_index("nonexistent"), None);
    }
}
