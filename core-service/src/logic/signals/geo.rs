//! Geo-Blocking & Proxy Detection
//!
//! Table-driven: which countries censor a host, and whether the URL looks
//! like a proxy or VPN service. No network access.

use async_trait::async_trait;

use super::types::{BlockedCountry, GeoReport, ProxyConfidence, ProxyDetection};
use crate::logic::domain::normalize_host;

#[async_trait]
pub trait GeoChecker: Send + Sync {
    async fn analyze(&self, url: &str) -> GeoReport;
}

/// (country, block reason, blocked domains)
const BLOCKED_DOMAINS: &[(&str, &str, &[&str])] = &[
    ("China", "Blocked by the Great Firewall", &[
        "google.com", "facebook.com", "twitter.com", "youtube.com",
        "instagram.com", "whatsapp.com", "telegram.org", "reddit.com",
    ]),
    ("Russia", "Blocked due to government restrictions", &[
        "facebook.com", "twitter.com", "instagram.com", "linkedin.com",
    ]),
    ("Iran", "Blocked by government censorship", &[
        "facebook.com", "twitter.com", "youtube.com", "instagram.com",
        "telegram.org", "whatsapp.com",
    ]),
    ("North Korea", "Internet access heavily restricted", &[
        "google.com", "facebook.com", "twitter.com", "youtube.com",
    ]),
    ("Turkey", "Blocked by government order", &["twitter.com", "wikipedia.org"]),
    ("UAE", "Blocked due to local regulations", &["skype.com", "whatsapp.com"]),
    ("India", "Banned by government (security concerns)", &["tiktok.com", "pubg.com"]),
];

const PROXY_KEYWORDS: &[&str] = &[
    "proxy", "vpn", "anonymizer", "hide", "mask", "tunnel", "bypass", "unblock",
];

const PROXY_DOMAINS: &[&str] = &[
    "proxysit", "hidemyass", "nordvpn", "expressvpn",
    "protonvpn", "vpngate", "anonymouse", "hide.me",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct StaticGeoChecker;

impl StaticGeoChecker {
    pub fn blocked_countries(&self, url: &str) -> Vec<BlockedCountry> {
        let Ok(host) = normalize_host(url) else {
            return Vec::new();
        };

        BLOCKED_DOMAINS.iter()
            .filter(|(_, _, domains)| domains.iter().any(|d| host.contains(d)))
            .map(|(country, reason, _)| BlockedCountry {
                country: country.to_string(),
                reason: reason.to_string(),
            })
            .collect()
    }

    pub fn detect_proxy(&self, url: &str) -> ProxyDetection {
        let lowered = url.to_lowercase();
        let detected_keywords: Vec<String> = PROXY_KEYWORDS.iter()
            .filter(|kw| lowered.contains(*kw))
            .map(|kw| kw.to_string())
            .collect();
        let keyword_hit = !detected_keywords.is_empty();
        let proxy_domain = PROXY_DOMAINS.iter().any(|d| lowered.contains(d));

        let (confidence, kind) = if proxy_domain {
            (ProxyConfidence::High, Some("VPN/Proxy Service"))
        } else if keyword_hit {
            (ProxyConfidence::Medium, Some("Proxy Keywords Detected"))
        } else {
            (ProxyConfidence::Low, None)
        };

        ProxyDetection {
            is_proxy_url: keyword_hit || proxy_domain,
            confidence,
            detected_keywords,
            kind: kind.map(str::to_string),
        }
    }
}

#[async_trait]
impl GeoChecker for StaticGeoChecker {
    async fn analyze(&self, url: &str) -> GeoReport {
        let blocked_in_countries = self.blocked_countries(url);
        let total_blocks = blocked_in_countries.len();
        GeoReport {
            blocked_in_countries,
            proxy_detection: self.detect_proxy(url),
            total_blocks,
        }
    }
}
