//! Explanation Store
//!
//! Finished deferred explanations keyed by URL hash, plus the set of hashes
//! still being computed. A lookup is Ready, Pending or Unknown, never an
//! error.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::types::StoredExplanation;
use crate::logic::cache::{CacheStats, Clock, SystemClock, TtlCache};

#[derive(Debug, Clone)]
pub enum ExplanationStatus {
    Ready(Arc<StoredExplanation>),
    Pending,
    Unknown,
}

impl ExplanationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready(_) => "found",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

pub struct ExplanationStore {
    ready: TtlCache<String, StoredExplanation>,
    pending: Mutex<HashSet<String>>,
    ttl: Duration,
}

impl ExplanationStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ready: TtlCache::with_clock(capacity, clock),
            pending: Mutex::new(HashSet::new()),
            ttl,
        }
    }

    /// Claim a hash for computation. False if it is already pending or ready.
    pub fn mark_pending(&self, url_hash: &str) -> bool {
        if self.ready.contains(&url_hash.to_string()) {
            return false;
        }
        self.pending.lock().insert(url_hash.to_string())
    }

    pub fn complete(&self, stored: StoredExplanation) -> Arc<StoredExplanation> {
        let key = stored.url_hash.clone();
        let stored = self.ready.insert(key.clone(), stored, self.ttl);
        self.pending.lock().remove(&key);
        stored
    }

    /// Drop a pending claim without a result
    pub fn abandon(&self, url_hash: &str) {
        self.pending.lock().remove(url_hash);
    }

    pub fn status(&self, url_hash: &str) -> ExplanationStatus {
        if let Some(stored) = self.ready.get(&url_hash.to_string()) {
            return ExplanationStatus::Ready(stored);
        }
        if self.pending.lock().contains(url_hash) {
            ExplanationStatus::Pending
        } else {
            ExplanationStatus::Unknown
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn stats(&self) -> CacheStats {
        self.ready.stats()
    }
}
