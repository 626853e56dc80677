//! Signals Module - External Risk Signals
//!
//! Best-effort availability and geo/proxy checks. Each call is bounded by
//! its own timeout; a late or failed check yields a safe default and a
//! recorded degradation, never an error.

pub mod types;
pub mod availability;
pub mod geo;

use std::sync::Arc;
use std::time::Duration;

pub use types::{
    AvailabilityReport,
    AvailabilityStatus,
    BlockedCountry,
    GeoReport,
    ProxyConfidence,
    ProxyDetection,
};
pub use availability::{AvailabilityChecker, HttpAvailabilityChecker};
pub use geo::{GeoChecker, StaticGeoChecker};

use crate::logic::error::{Degradation, SignalKind};

/// A signal report plus what degraded while collecting it
#[derive(Debug, Clone)]
pub struct Observed<T> {
    pub report: T,
    pub degradation: Option<Degradation>,
}

/// Collaborators and budgets for the external checks
pub struct SignalHub {
    availability: Option<Arc<dyn AvailabilityChecker>>,
    geo: Option<Arc<dyn GeoChecker>>,
    availability_timeout: Duration,
    geo_timeout: Duration,
}

impl SignalHub {
    pub fn new(
        availability: Arc<dyn AvailabilityChecker>,
        geo: Arc<dyn GeoChecker>,
        availability_timeout: Duration,
        geo_timeout: Duration,
    ) -> Self {
        Self {
            availability: Some(availability),
            geo: Some(geo),
            availability_timeout,
            geo_timeout,
        }
    }

    /// No external checks at all
    pub fn disabled() -> Self {
        Self {
            availability: None,
            geo: None,
            availability_timeout: Duration::ZERO,
            geo_timeout: Duration::ZERO,
        }
    }

    /// HTTP availability check plus the static geo tables
    pub fn http(availability_timeout: Duration, geo_timeout: Duration) -> Self {
        let check_timeout = availability_timeout
            .saturating_sub(Duration::from_secs(1))
            .max(Duration::from_millis(500));

        match HttpAvailabilityChecker::new(check_timeout) {
            Ok(checker) => Self::new(Arc::new(checker), Arc::new(StaticGeoChecker), availability_timeout, geo_timeout),
            Err(e) => {
                log::warn!("HTTP client unavailable ({}), availability checks disabled", e);
                Self {
                    availability: None,
                    geo: Some(Arc::new(StaticGeoChecker)),
                    availability_timeout,
                    geo_timeout,
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.availability.is_some() || self.geo.is_some()
    }

    pub async fn availability(&self, url: &str) -> Option<Observed<AvailabilityReport>> {
        let checker = self.availability.as_ref()?;
        let observed = match tokio::time::timeout(self.availability_timeout, checker.check(url)).await {
            Ok(report) => Observed { report, degradation: None },
            Err(_) => {
                log::warn!("Availability check timeout for: {}", url);
                Observed {
                    report: AvailabilityReport::timed_out(),
                    degradation: Some(Degradation::SignalTimeout { signal: SignalKind::Availability }),
                }
            }
        };
        Some(observed)
    }

    pub async fn geo(&self, url: &str) -> Option<Observed<GeoReport>> {
        let checker = self.geo.as_ref()?;
        let observed = match tokio::time::timeout(self.geo_timeout, checker.analyze(url)).await {
            Ok(report) => Observed { report, degradation: None },
            Err(_) => {
                log::warn!("Geo analysis timeout for: {}", url);
                Observed {
                    report: GeoReport::default(),
                    degradation: Some(Degradation::SignalTimeout { signal: SignalKind::Geo }),
                }
            }
        };
        Some(observed)
    }
}
