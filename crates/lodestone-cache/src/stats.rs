//! Counters collected by a cache instance

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of a cache's counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Cache instance name
    pub name: String,

    /// Success entries currently stored, expired or not
    pub entries: usize,

    /// Failure entries currently stored, expired or not
    pub failures: usize,

    /// Live success lookups
    pub hits: u64,

    /// Success lookups that found nothing live
    pub misses: u64,

    /// Live failure lookups
    pub failure_hits: u64,

    /// Entries removed by `purge_expired`
    pub purged: u64,

    /// Completed `purge_expired` calls
    pub sweep_count: u64,
}

impl CacheStats {
    /// Fraction of success lookups that hit, 0.0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Generate a one-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{}: {} entries, {} failures, {} hits / {} misses ({:.1}%), {} failure hits, {} purged over {} sweeps",
            self.name,
            self.entries,
            self.failures,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
            self.failure_hits,
            self.purged,
            self.sweep_count
        )
    }
}

/// Lock-free counters shared by all readers of one cache
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    failure_hits: AtomicU64,
    purged: AtomicU64,
    sweep_count: AtomicU64,
}

impl Counters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure_hit(&self) {
        self.failure_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self, purged: usize) {
        self.purged.fetch_add(purged as u64, Ordering::Relaxed);
        self.sweep_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, name: &str, entries: usize, failures: usize) -> CacheStats {
        CacheStats {
            name: name.to_string(),
            entries,
            failures,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            failure_hits: self.failure_hits.load(Ordering::Relaxed),
            purged: self.purged.load(Ordering::Relaxed),
            sweep_count: self.sweep_count.load(Ordering::Relaxed),
        }
    }
}
