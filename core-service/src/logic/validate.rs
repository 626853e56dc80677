//! URL Validation
//!
//! Gate in front of the pipeline: anything rejected here never reaches the
//! classifier.

use url::Url;

use crate::constants::{MAX_URL_LENGTH, MIN_URL_LENGTH};
use super::error::PredictError;

/// Markers that never belong in a URL we are asked to classify
const INJECTION_MARKERS: &[&str] = &["<script", "javascript:", "data:", "vbscript:"];

/// Validate a raw URL and return its trimmed form
pub fn validate_url(raw: &str) -> Result<&str, PredictError> {
    let url = raw.trim();

    if url.is_empty() {
        return Err(invalid("URL cannot be empty"));
    }
    if url.len() > MAX_URL_LENGTH {
        return Err(invalid(&format!("URL too long (max {} characters)", MAX_URL_LENGTH)));
    }
    if url.len() < MIN_URL_LENGTH {
        return Err(invalid("URL too short"));
    }

    let lower = url.to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(invalid("URL must start with http:// or https://"));
    }

    let parsed = Url::parse(url).map_err(|_| invalid("Invalid URL format"))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("Invalid URL format: missing domain"));
    }

    if INJECTION_MARKERS.iter().any(|m| lower.contains(m)) {
        return Err(invalid("URL contains suspicious content"));
    }

    Ok(url)
}

fn invalid(msg: &str) -> PredictError {
    PredictError::InvalidInput(msg.to_string())
}
