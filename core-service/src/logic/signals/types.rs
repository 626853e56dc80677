//! Signal Types
//!
//! Reports returned by the external risk-signal collaborators and the risk
//! scalars the threat aggregator derives from them.

use serde::{Deserialize, Serialize};

// ============================================================================
// AVAILABILITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Success,
    SslError,
    Timeout,
    ConnectionError,
    RedirectLoop,
    RequestError,
    Error,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::SslError => "ssl_error",
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
            Self::RedirectLoop => "redirect_loop",
            Self::RequestError => "request_error",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub status: AvailabilityStatus,
    /// `None` when reachability could not be determined
    pub is_accessible: Option<bool>,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub ssl_valid: Option<bool>,
    pub redirect_count: usize,
    pub final_url: Option<String>,
    pub server: Option<String>,
    pub error_message: Option<String>,
    pub security_flags: Vec<String>,
}

impl AvailabilityReport {
    fn failure(status: AvailabilityStatus, is_accessible: Option<bool>, message: impl Into<String>) -> Self {
        Self {
            status,
            is_accessible,
            status_code: None,
            response_time_ms: None,
            ssl_valid: None,
            redirect_count: 0,
            final_url: None,
            server: None,
            error_message: Some(message.into()),
            security_flags: Vec::new(),
        }
    }

    /// Generic failure; the site is treated as inaccessible
    pub fn failed(message: impl Into<String>) -> Self {
        Self::failure(AvailabilityStatus::Error, Some(false), message)
    }

    pub fn with_status(status: AvailabilityStatus, is_accessible: Option<bool>, message: impl Into<String>) -> Self {
        Self::failure(status, is_accessible, message)
    }

    /// Check exceeded its budget
    pub fn timed_out() -> Self {
        Self::failure(AvailabilityStatus::Timeout, Some(false), "Availability check timed out")
    }

    /// Unknown reachability counts as offline
    pub fn is_offline(&self) -> bool {
        !self.is_accessible.unwrap_or(false)
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self.status_code, Some(403) | Some(405))
    }

    pub fn is_unreachable(&self) -> bool {
        self.is_offline() || self.is_restricted()
    }

    pub fn ssl_invalid(&self) -> bool {
        self.ssl_valid == Some(false)
    }

    pub fn explicitly_inaccessible(&self) -> bool {
        self.is_accessible == Some(false)
    }

    /// 0.8 on check error, 0.6 when inaccessible, 0.4 without valid TLS
    pub fn risk(&self) -> f32 {
        if self.status == AvailabilityStatus::Error {
            0.8
        } else if self.is_offline() {
            0.6
        } else if !self.ssl_valid.unwrap_or(false) {
            0.4
        } else {
            0.0
        }
    }

    /// Short label for summaries: `OFFLINE` or `RESTRICTED (HTTP 403)`
    pub fn describe_unreachable(&self) -> String {
        match self.status_code {
            Some(code) if !self.is_offline() => format!("RESTRICTED (HTTP {})", code),
            _ => "OFFLINE".to_string(),
        }
    }
}

// ============================================================================
// GEO / PROXY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyConfidence {
    #[default]
    Low,
    Medium,
    High,
}

impl ProxyConfidence {
    pub fn risk(&self) -> f32 {
        match self {
            Self::High => 0.9,
            Self::Medium => 0.6,
            Self::Low => 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedCountry {
    pub country: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProxyDetection {
    pub is_proxy_url: bool,
    pub confidence: ProxyConfidence,
    pub detected_keywords: Vec<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoReport {
    pub blocked_in_countries: Vec<BlockedCountry>,
    pub proxy_detection: ProxyDetection,
    pub total_blocks: usize,
}

impl GeoReport {
    pub fn is_geo_restricted(&self) -> bool {
        self.total_blocks > 0
    }

    /// Blocks normalized by 5, at least 0.5 for proxy URLs
    pub fn geo_risk(&self) -> f32 {
        let risk = (self.total_blocks as f32 / 5.0).min(1.0);
        if self.proxy_detection.is_proxy_url {
            risk.max(0.5)
        } else {
            risk
        }
    }

    pub fn proxy_risk(&self) -> f32 {
        if self.proxy_detection.is_proxy_url {
            self.proxy_detection.confidence.risk()
        } else {
            0.0
        }
    }
}
