//! Attack Type Classifier
//!
//! Keyword buckets over the lower-cased URL. Only meaningful for phishing
//! verdicts; callers skip it otherwise.

use serde::{Deserialize, Serialize};

const CREDENTIAL_WORDS: &[&str] = &["login", "signin", "account", "verify", "confirm"];
const BRAND_WORDS: &[&str] = &["paypal", "amazon", "google", "facebook", "microsoft"];
const PAYMENT_WORDS: &[&str] = &["payment", "invoice", "billing", "checkout"];
const PRIZE_WORDS: &[&str] = &["prize", "winner", "congratulations", "survey", "reward"];
const DROPPER_WORDS: &[&str] = &["download", "update", "install", "setup"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackType {
    #[serde(rename = "Brand Impersonation (Credential Harvesting)")]
    BrandImpersonation,
    #[serde(rename = "Credential Harvesting")]
    CredentialHarvesting,
    #[serde(rename = "Payment Scam")]
    PaymentScam,
    #[serde(rename = "Survey/Prize Scam")]
    PrizeScam,
    #[serde(rename = "Malware Dropper")]
    MalwareDropper,
    #[serde(rename = "Generic Phishing")]
    Generic,
}

impl AttackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackType::BrandImpersonation => "Brand Impersonation (Credential Harvesting)",
            AttackType::CredentialHarvesting => "Credential Harvesting",
            AttackType::PaymentScam => "Payment Scam",
            AttackType::PrizeScam => "Survey/Prize Scam",
            AttackType::MalwareDropper => "Malware Dropper",
            AttackType::Generic => "Generic Phishing",
        }
    }

    /// One-line description of how this kind of attack works
    pub fn tactic(&self) -> &'static str {
        match self {
            AttackType::BrandImpersonation => "Copies a well-known brand's sign-in page to collect credentials",
            AttackType::CredentialHarvesting => "Presents a fake sign-in or verification form to capture passwords",
            AttackType::PaymentScam => "Requests payment or card details for a fake invoice or checkout",
            AttackType::PrizeScam => "Promises a reward to lure visitors into handing over personal data",
            AttackType::MalwareDropper => "Pushes a fake update or installer that carries malware",
            AttackType::Generic => "Imitates a legitimate site to deceive visitors",
        }
    }
}

impl std::fmt::Display for AttackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn any_of(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| haystack.contains(w))
}

pub fn classify_attack(url: &str) -> AttackType {
    let url = url.to_lowercase();

    if any_of(&url, CREDENTIAL_WORDS) {
        if any_of(&url, BRAND_WORDS) {
            return AttackType::BrandImpersonation;
        }
        return AttackType::CredentialHarvesting;
    }
    if any_of(&url, PAYMENT_WORDS) {
        return AttackType::PaymentScam;
    }
    if any_of(&url, PRIZE_WORDS) {
        return AttackType::PrizeScam;
    }
    if any_of(&url, DROPPER_WORDS) {
        return AttackType::MalwareDropper;
    }
    AttackType::Generic
}
