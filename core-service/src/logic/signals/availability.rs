//! Availability Checker
//!
//! HEAD request to the target URL. Never fails: every error becomes a report
//! with a status and a message.

use std::error::Error as StdError;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, SERVER, STRICT_TRANSPORT_SECURITY, USER_AGENT, X_FRAME_OPTIONS};
use reqwest::redirect::Policy;

use super::types::{AvailabilityReport, AvailabilityStatus};

const CHECK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAX_REDIRECTS: usize = 10;
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

#[async_trait]
pub trait AvailabilityChecker: Send + Sync {
    async fn check(&self, url: &str) -> AvailabilityReport;
}

pub struct HttpAvailabilityChecker {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpAvailabilityChecker {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client, timeout })
    }
}

/// Security header flags for a response
pub fn security_flags(url: &str, headers: &HeaderMap) -> Vec<String> {
    let https = url.starts_with("https://");
    let mut flags = Vec::new();
    if !https {
        flags.push("no_https".to_string());
    }
    if !headers.contains_key(X_FRAME_OPTIONS) {
        flags.push("no_frame_protection".to_string());
    }
    if https && !headers.contains_key(STRICT_TRANSPORT_SECURITY) {
        flags.push("no_hsts".to_string());
    }
    flags
}

fn mentions_tls(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = source {
        let text = e.to_string().to_ascii_lowercase();
        if text.contains("certificate") || text.contains("ssl") || text.contains("tls") {
            return true;
        }
        source = e.source();
    }
    false
}

fn classify_error(err: &reqwest::Error, timeout: Duration) -> AvailabilityReport {
    let short: String = err.to_string().chars().take(100).collect();

    if err.is_timeout() {
        return AvailabilityReport::with_status(
            AvailabilityStatus::Timeout,
            None,
            format!("Connection timeout (>{}s)", timeout.as_secs()),
        );
    }
    if err.is_redirect() {
        return AvailabilityReport::with_status(
            AvailabilityStatus::RedirectLoop,
            Some(false),
            "Too many redirects (possible redirect loop)",
        );
    }
    if mentions_tls(err) {
        let mut report = AvailabilityReport::with_status(
            AvailabilityStatus::SslError,
            Some(false),
            "Invalid or expired SSL certificate",
        );
        report.ssl_valid = Some(false);
        return report;
    }
    if err.is_connect() {
        return AvailabilityReport::with_status(
            AvailabilityStatus::ConnectionError,
            Some(false),
            "Cannot connect to server (DNS failure or server down)",
        );
    }
    if err.is_builder() || err.is_request() {
        return AvailabilityReport::with_status(
            AvailabilityStatus::RequestError,
            Some(false),
            format!("Request failed: {}", short),
        );
    }
    AvailabilityReport::with_status(AvailabilityStatus::Error, None, format!("Unexpected error: {}", short))
}

#[async_trait]
impl AvailabilityChecker for HttpAvailabilityChecker {
    async fn check(&self, url: &str) -> AvailabilityReport {
        let start = Instant::now();
        let response = self.client
            .head(url)
            .header(USER_AGENT, CHECK_USER_AGENT)
            .send()
            .await;

        match response {
            Ok(resp) => {
                let code = resp.status().as_u16();
                let final_url = resp.url().to_string();
                let redirected = final_url.trim_end_matches('/') != url.trim_end_matches('/');
                log::debug!("URL accessible: {} (status: {})", url, code);

                AvailabilityReport {
                    status: AvailabilityStatus::Success,
                    // 401/403/405 count as not accessible
                    is_accessible: Some(code < 400 || code == 404),
                    status_code: Some(code),
                    response_time_ms: Some(start.elapsed().as_millis() as u64),
                    ssl_valid: Some(url.starts_with("https://")),
                    redirect_count: usize::from(redirected),
                    final_url: Some(if redirected { final_url } else { url.to_string() }),
                    server: resp.headers().get(SERVER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string),
                    error_message: None,
                    security_flags: security_flags(url, resp.headers()),
                }
            }
            Err(e) => {
                let report = classify_error(&e, self.timeout);
                log::warn!("Availability check for {} failed: {}", url, report.status);
                report
            }
        }
    }
}
