//! Service statistics with atomic counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

#[derive(Debug)]
pub(crate) struct ServiceStats {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    recomputations: AtomicU64,
    recompute_failures: AtomicU64,
    storage_errors: AtomicU64,
    invalidated: AtomicU64,
    stats_since: SystemTime,
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
            recomputations: AtomicU64::new(0),
            recompute_failures: AtomicU64::new(0),
            storage_errors: AtomicU64::new(0),
            invalidated: AtomicU64::new(0),
            stats_since: SystemTime::now(),
        }
    }
}

impl ServiceStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recomputation(&self) {
        self.recomputations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_recompute_failure(&self) {
        self.recompute_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidated(&self, count: u64) {
        self.invalidated.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self, in_flight: usize) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            recomputations: self.recomputations.load(Ordering::Relaxed),
            recompute_failures: self.recompute_failures.load(Ordering::Relaxed),
            storage_errors: self.storage_errors.load(Ordering::Relaxed),
            invalidated: self.invalidated.load(Ordering::Relaxed),
            in_flight: in_flight as u64,
            stats_since: self.stats_since,
        }
    }
}

/// Point-in-time view of `CacheService` activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    /// Provider reads that returned a usable value
    pub hits: u64,
    /// Provider reads that returned nothing, failed, or held an undecodable value
    pub misses: u64,
    /// Calls that awaited another caller's computation
    pub coalesced: u64,
    /// Times a recompute function was started
    pub recomputations: u64,
    pub recompute_failures: u64,
    /// Provider failures absorbed by the service
    pub storage_errors: u64,
    /// Keys successfully deleted through invalidation
    pub invalidated: u64,
    /// Computations currently registered in the pending table
    pub in_flight: u64,
    pub stats_since: SystemTime,
}

impl CacheStatistics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
