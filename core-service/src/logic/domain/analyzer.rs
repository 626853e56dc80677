//! Domain Risk Analyzer
//!
//! Classifier-independent reputation verdict for a URL's host. Pure and
//! deterministic: same tables and host, same verdict, no network.
//!
//! Checks run in priority order, first match wins:
//! 1. host normalization (invalid format)
//! 2. trusted TLD
//! 3. exact high-trust match
//! 4. subdomain of a high-trust domain
//! 5. brand mimicry
//! 6. phishing keyword
//! 7. typosquat
//! 8. not whitelisted

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use super::typosquat::closest_lookalike;
use super::whitelist::{BRAND_PATTERNS, HIGH_TRUST_DOMAINS, PHISHING_KEYWORDS, TRUSTED_TLDS};
use crate::logic::features::extractor::with_scheme;
use crate::logic::features::UrlParts;

/// Maximum edit distance for a lookalike
const TYPOSQUAT_MAX_DISTANCE: usize = 2;
/// Hosts this short are never compared
const TYPOSQUAT_MIN_HOST_LEN: usize = 5;

const ADJ_TRUSTED_TLD: f32 = 0.4;
const ADJ_EXACT_MATCH: f32 = 0.3;
const ADJ_SUBDOMAIN: f32 = 0.2;
const ADJ_KEYWORD: f32 = -0.3;
const ADJ_BRAND_MIMICRY: f32 = -0.9;
const ADJ_TYPOSQUAT: f32 = -0.8;

/// Adjustment above which a verdict counts as strongly trusted
pub const STRONG_TRUST: f32 = 0.2;

static KEYWORD_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    PHISHING_KEYWORDS.iter()
        .filter_map(|kw| {
            Regex::new(&format!(r"\b{}\b", regex::escape(kw)))
                .ok()
                .map(|re| (*kw, re))
        })
        .collect()
});

// ============================================================================
// VERDICT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainReason {
    TrustedTld(String),
    ExactMatch,
    SubdomainOf(String),
    PhishingKeyword(String),
    BrandMimicry(String),
    Typosquat(String),
    NotWhitelisted,
    InvalidFormat,
    ParseError,
}

impl DomainReason {
    /// Stable reason code
    pub fn code(&self) -> String {
        match self {
            Self::TrustedTld(tld) => format!("trusted_tld_{}", tld),
            Self::ExactMatch => "exact_domain_match".to_string(),
            Self::SubdomainOf(parent) => format!("subdomain_of_{}", parent),
            Self::PhishingKeyword(kw) => format!("phishing_keyword_{}", kw),
            Self::BrandMimicry(brand) => format!("brand_mimicry_{}", brand),
            Self::Typosquat(target) => format!("typosquat_target_{}", target),
            Self::NotWhitelisted => "not_whitelisted".to_string(),
            Self::InvalidFormat => "invalid_domain_format".to_string(),
            Self::ParseError => "parse_error".to_string(),
        }
    }

    pub fn is_lookalike(&self) -> bool {
        matches!(self, Self::BrandMimicry(_) | Self::Typosquat(_))
    }

    pub fn is_typosquat(&self) -> bool {
        matches!(self, Self::Typosquat(_))
    }
}

impl std::fmt::Display for DomainReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for DomainReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainVerdict {
    pub is_trusted: bool,
    pub reason: DomainReason,
    /// In [-1, 1]; positive means trust, negative means suspicion
    pub trust_adjustment: f32,
}

impl DomainVerdict {
    fn new(reason: DomainReason, trust_adjustment: f32) -> Self {
        Self {
            is_trusted: trust_adjustment > 0.0,
            reason,
            trust_adjustment,
        }
    }

    pub fn is_strongly_trusted(&self) -> bool {
        self.trust_adjustment > STRONG_TRUST
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

pub struct DomainAnalyzer {
    /// Sorted so lookalike ties resolve the same way every time
    trusted: BTreeSet<String>,
    brands: Vec<(String, Vec<String>)>,
}

impl Default for DomainAnalyzer {
    fn default() -> Self {
        Self::with_trusted(HIGH_TRUST_DOMAINS.iter().copied())
    }
}

impl DomainAnalyzer {
    pub fn with_trusted<'a>(domains: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            trusted: domains.into_iter().map(|d| d.to_ascii_lowercase()).collect(),
            brands: BRAND_PATTERNS.iter()
                .map(|(brand, allowed)| (brand.to_string(), allowed.iter().map(|s| s.to_string()).collect()))
                .collect(),
        }
    }

    pub fn is_high_trust(&self, host: &str) -> bool {
        self.trusted.contains(host)
    }

    pub fn trusted_count(&self) -> usize {
        self.trusted.len()
    }

    pub fn analyze(&self, url: &str) -> DomainVerdict {
        match normalize_host(url) {
            Ok(host) => self.analyze_host(&host),
            Err(reason) => {
                if reason == DomainReason::ParseError {
                    log::warn!("Domain analysis could not parse {:.50}", url);
                }
                DomainVerdict::new(reason, 0.0)
            }
        }
    }

    /// Analyze an already-normalized host
    pub fn analyze_host(&self, host: &str) -> DomainVerdict {
        if let Some(tld) = TRUSTED_TLDS.iter().find(|tld| host.ends_with(*tld)) {
            return DomainVerdict::new(DomainReason::TrustedTld(tld.to_string()), ADJ_TRUSTED_TLD);
        }

        if self.trusted.contains(host) {
            return DomainVerdict::new(DomainReason::ExactMatch, ADJ_EXACT_MATCH);
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() > 2 {
            for i in 1..labels.len() {
                let parent = labels[i..].join(".");
                if self.trusted.contains(&parent) {
                    return DomainVerdict::new(DomainReason::SubdomainOf(parent), ADJ_SUBDOMAIN);
                }
            }
        }

        for (brand, allowed) in &self.brands {
            if !host.contains(brand.as_str()) {
                continue;
            }
            let authorized = allowed.iter()
                .any(|a| host == a || host.ends_with(&format!(".{}", a)));
            if !authorized {
                log::warn!("Brand mimicry: '{}' in unauthorized host {}", brand, host);
                return DomainVerdict::new(DomainReason::BrandMimicry(brand.clone()), ADJ_BRAND_MIMICRY);
            }
        }

        if let Some((kw, _)) = KEYWORD_PATTERNS.iter().find(|(_, re)| re.is_match(host)) {
            return DomainVerdict::new(DomainReason::PhishingKeyword(kw.to_string()), ADJ_KEYWORD);
        }

        if host.chars().count() >= TYPOSQUAT_MIN_HOST_LEN {
            let candidates = self.trusted.iter().map(String::as_str).filter(|d| d.contains('.'));
            if let Some((target, distance)) = closest_lookalike(host, candidates, TYPOSQUAT_MAX_DISTANCE) {
                log::warn!("Typosquat: {} is {} edit(s) from {}", host, distance, target);
                return DomainVerdict::new(DomainReason::Typosquat(target.to_string()), ADJ_TYPOSQUAT);
            }
        }

        DomainVerdict::new(DomainReason::NotWhitelisted, 0.0)
    }
}

/// Lower-case host without `www.`, userinfo, port or path
pub fn normalize_host(url: &str) -> Result<String, DomainReason> {
    let lowered = url.trim().to_lowercase();
    let with_scheme = with_scheme(&lowered);
    let parts = UrlParts::split(&with_scheme).ok_or(DomainReason::ParseError)?;

    let host = parts.host.strip_prefix("www.").unwrap_or(parts.host);
    let host = host.trim_end_matches('.');
    if host.is_empty() || !host.contains('.') {
        return Err(DomainReason::InvalidFormat);
    }
    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(url: &str) -> String {
        DomainAnalyzer::default().analyze(url).reason.code()
    }

    #[test]
    fn test_exact_match_and_www_strip() {
        let v = DomainAnalyzer::default().analyze("https://www.google.com/search?q=x");
        assert_eq!(v.reason, DomainReason::ExactMatch);
        assert!(v.is_trusted);
        assert!(v.is_strongly_trusted());
        assert_eq!(v.reason.code(), "exact_domain_match");
    }

    #[test]
    fn test_trusted_tld() {
        let v = DomainAnalyzer::default().analyze("https://www.nasa.gov");
        assert_eq!(v.reason.code(), "trusted_tld_.gov");
        assert!((v.trust_adjustment - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_subdomain_of_trusted() {
        assert_eq!(reason("https://accounts.google.com/signin"), "subdomain_of_google.com");
        assert_eq!(reason("https://mail.google.com:443"), "subdomain_of_google.com");
        let v = DomainAnalyzer::default().analyze("https://accounts.google.com");
        assert!(v.is_trusted);
        assert!(!v.is_strongly_trusted());
    }

    #[test]
    fn test_typosquat() {
        assert_eq!(reason("http://gogle.com"), "typosquat_target_google.com");
        assert_eq!(reason("https://paypa1.com/login"), "typosquat_target_paypal.com");
        assert!(DomainAnalyzer::default().analyze("http://gogle.com").trust_adjustment < -0.5);
    }

    #[test]
    fn test_brand_mimicry() {
        assert_eq!(reason("https://accounts-google-secure.com"), "brand_mimicry_google");
        assert_eq!(reason("http://accounts-google-verify.tk/login"), "brand_mimicry_google");
        assert_eq!(reason("http://paypal-login.example.net"), "brand_mimicry_paypal");
        // brand wins over the keyword it also carries
        assert_ne!(reason("http://secure-paypal.com"), "phishing_keyword_secure");
    }

    #[test]
    fn test_phishing_keyword() {
        assert_eq!(reason("http://secure-login.example.org"), "phishing_keyword_login");
        assert_eq!(reason("http://verify.shop-deals.net"), "phishing_keyword_verify");
        // substrings inside words do not count
        assert_eq!(reason("http://loginator.example.org"), "not_whitelisted");
    }

    #[test]
    fn test_invalid_and_parse_error() {
        assert_eq!(reason("http://localhost"), "invalid_domain_format");
        assert_eq!(reason(""), "invalid_domain_format");
        assert_eq!(reason("http://example.com:notaport/"), "parse_error");
    }

    #[test]
    fn test_not_whitelisted_is_neutral() {
        let v = DomainAnalyzer::default().analyze("https://my-little-bakery.fr");
        assert_eq!(v.reason, DomainReason::NotWhitelisted);
        assert_eq!(v.trust_adjustment, 0.0);
        assert!(!v.is_trusted);
    }

    #[test]
    fn test_deterministic() {
        let analyzer = DomainAnalyzer::default();
        let first = analyzer.analyze("http://amazom.com");
        for _ in 0..10 {
            assert_eq!(analyzer.analyze("http://amazom.com"), first);
        }
    }
}
