//! Cache Module - Bounded TTL Caches
//!
//! Shared by the prediction results, the feature memo and the
//! explanation store.

pub mod clock;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ttl::{CacheStats, TtlCache};
