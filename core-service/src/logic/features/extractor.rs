//! URL Feature Extractor
//!
//! `extract(url) -> FeatureVector` never fails. A URL that cannot be split
//! into its parts still yields a vector carrying the length and character
//! counts of the raw string.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use super::layout::idx;
use super::vector::FeatureVector;
use crate::constants::FEATURE_CACHE_TTL_SECS;
use crate::logic::cache::TtlCache;

// ============================================================================
// PATTERNS
// ============================================================================

static IP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("static regex")
});

static SENSITIVE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(login|signin|account|verify|secure|update|banking|confirm|password|credential|paypal|ebay|amazon|facebook|google|apple|wallet|bank|security|authenticate|validation|click|suspicious|alert|warning|important|urgent|immediate|action|required|phish)",
    )
    .expect("static regex")
});

pub const SUSPICIOUS_TLDS: &[&str] = &[
    ".tk", ".ml", ".ga", ".cf", ".gq", ".xyz", ".top", ".club", ".loan",
    ".click", ".win", ".bid", ".stream", ".download", ".work",
];

pub const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly", "tinyurl.com", "goo.gl", "ow.ly", "t.co", "is.gd", "buff.ly",
    "adf.ly", "shorte.st", "bc.vc", "tiny.cc", "tr.im", "prettylink.pro", "short.to",
];

pub const SUSPICIOUS_PORTS: &[u16] = &[8080, 8443, 4444, 4443, 8888, 3389, 5900];

// ============================================================================
// URL SPLITTING
// ============================================================================

/// Raw URL components, kept verbatim (no normalization)
#[derive(Debug, Clone, PartialEq)]
pub struct UrlParts<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub port: u16,
}

impl<'a> UrlParts<'a> {
    /// Split `scheme://netloc/path?query#fragment`. `None` when the
    /// authority carries an unparseable port.
    pub fn split(url: &'a str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;

        let netloc_end = rest.find(&['/', '?', '#'][..]).unwrap_or(rest.len());
        let netloc = &rest[..netloc_end];
        let tail = &rest[netloc_end..];

        let tail = tail.split('#').next().unwrap_or("");
        let (path, query) = tail.split_once('?').unwrap_or((tail, ""));

        let hostport = netloc.rsplit('@').next().unwrap_or(netloc);
        let (host, port) = split_port(hostport)?;
        let port = port.unwrap_or(if scheme.eq_ignore_ascii_case("https") { 443 } else { 80 });

        Some(Self { scheme, host, path, query, port })
    }
}

fn split_port(hostport: &str) -> Option<(&str, Option<u16>)> {
    // bracketed IPv6 literal
    if hostport.starts_with('[') {
        let close = hostport.find(']')?;
        let host = &hostport[..=close];
        return match hostport[close + 1..].strip_prefix(':') {
            Some("") | None => Some((host, None)),
            Some(p) => p.parse().ok().map(|port| (host, Some(port))),
        };
    }

    match hostport.split_once(':') {
        None => Some((hostport, None)),
        Some((host, "")) => Some((host, None)),
        Some((host, p)) => p.parse().ok().map(|port| (host, Some(port))),
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Prepend `http://` when no scheme is present
pub fn with_scheme(url: &str) -> std::borrow::Cow<'_, str> {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        std::borrow::Cow::Borrowed(url)
    } else {
        std::borrow::Cow::Owned(format!("http://{}", url))
    }
}

pub fn extract(raw: &str) -> FeatureVector {
    let url = with_scheme(raw);
    let url = url.as_ref();

    match UrlParts::split(url) {
        Some(parts) => extract_parts(url, &parts),
        None => minimal(url),
    }
}

fn extract_parts(url: &str, parts: &UrlParts<'_>) -> FeatureVector {
    let mut v = FeatureVector::new();
    let host = parts.host;
    let total = url.chars().count();

    v.set(idx::URL_LENGTH, total as f32);
    v.set(idx::DOMAIN_LENGTH, host.chars().count() as f32);
    v.set(idx::IS_HTTPS, flag(parts.scheme == "https"));
    v.set(idx::NUM_DOTS, count(url, '.'));
    v.set(idx::NUM_HYPHENS, count(url, '-'));
    v.set(idx::NUM_UNDERSCORES, count(url, '_'));
    v.set(idx::NUM_PERCENT, count(url, '%'));
    v.set(idx::NUM_AMPERSAND, count(url, '&'));
    v.set(idx::NUM_HASH, count(url, '#'));
    let query_parts = if parts.query.is_empty() { 0 } else { parts.query.split('&').count() };
    v.set(idx::NUM_QUERY_COMPONENTS, query_parts as f32);

    let digits = url.chars().filter(|c| c.is_numeric()).count();
    v.set(idx::NUM_NUMERIC_CHARS, digits as f32);

    v.set(idx::SUBDOMAIN_LEVEL, count(host, '.'));
    v.set(idx::HAS_IP_ADDRESS, flag(IP_PATTERN.is_match(host)));
    v.set(idx::HAS_AT, flag(url.contains('@')));

    let segments: Vec<&str> = parts.path.split('/').filter(|s| !s.is_empty()).collect();
    v.set(idx::PATH_LENGTH, parts.path.chars().count() as f32);
    v.set(idx::LARGEST_LINE_LENGTH, segments.iter().map(|s| s.chars().count()).max().unwrap_or(0) as f32);
    v.set(idx::LINE_OF_CODE, segments.len() as f32);

    v.set(idx::NUM_SENSITIVE_WORDS, sensitive_word_count(url) as f32);
    v.set(idx::HAS_DOUBLE_SLASH, flag(parts.path.contains("//")));
    v.set(idx::HAS_SUSPICIOUS_TLD, flag(has_suspicious_tld(host)));

    if total > 0 {
        let letters = url.chars().filter(|c| c.is_alphabetic()).count();
        let special = url.chars().filter(|c| !c.is_alphanumeric()).count();
        v.set(idx::LETTER_RATIO, letters as f32 / total as f32);
        v.set(idx::DIGIT_RATIO, digits as f32 / total as f32);
        v.set(idx::SPECIAL_CHAR_RATIO, special as f32 / total as f32);
    }

    v.set(idx::NUM_SLASHES, count(url, '/'));
    v.set(idx::NUM_EQUALS, count(url, '='));
    v.set(idx::NUM_QUESTION_MARKS, count(url, '?'));
    v.set(idx::DOMAIN_ENTROPY, shannon_entropy(host));
    v.set(idx::IS_SHORT_URL, flag(is_short_url(host)));
    v.set(idx::HAS_SUSPICIOUS_PORT, flag(SUSPICIOUS_PORTS.contains(&parts.port)));

    v
}

/// Length-based features only
fn minimal(url: &str) -> FeatureVector {
    let mut v = FeatureVector::new();
    v.set(idx::URL_LENGTH, url.chars().count() as f32);
    v.set(idx::NUM_DOTS, count(url, '.'));
    v.set(idx::NUM_HYPHENS, count(url, '-'));
    v
}

fn flag(b: bool) -> f32 {
    if b { 1.0 } else { 0.0 }
}

fn count(s: &str, c: char) -> f32 {
    s.matches(c).count() as f32
}

pub fn sensitive_word_count(url: &str) -> usize {
    SENSITIVE_WORDS.find_iter(&url.to_lowercase()).count()
}

pub fn has_suspicious_tld(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    SUSPICIOUS_TLDS.iter().any(|tld| host.ends_with(tld))
}

pub fn is_short_url(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    SHORTENER_DOMAINS.iter().any(|d| host.contains(d))
}

/// Shannon entropy (bits) over the lower-cased characters
pub fn shannon_entropy(text: &str) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let mut counts = std::collections::HashMap::new();
    let mut len = 0usize;
    for c in text.chars().flat_map(char::to_lowercase) {
        *counts.entry(c).or_insert(0usize) += 1;
        len += 1;
    }
    let len = len as f32;
    counts.values()
        .map(|&n| {
            let p = n as f32 / len;
            -p * p.log2()
        })
        .sum()
}

// ============================================================================
// MEMOIZED EXTRACTOR
// ============================================================================

/// Bounded memo keyed on the raw URL
pub struct UrlFeatureExtractor {
    memo: TtlCache<String, FeatureVector>,
    ttl: Duration,
}

impl UrlFeatureExtractor {
    pub fn new(capacity: usize) -> Self {
        Self {
            memo: TtlCache::new(capacity),
            ttl: Duration::from_secs(FEATURE_CACHE_TTL_SECS),
        }
    }

    pub fn extract(&self, url: &str) -> Arc<FeatureVector> {
        let key = url.to_string();
        if let Some(hit) = self.memo.get(&key) {
            return hit;
        }
        self.memo.insert(key, extract(url), self.ttl)
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }
}
