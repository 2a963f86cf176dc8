//! Two-namespace TTL cache
//!
//! Successes and failures live in separate maps so that a key can carry both
//! a cached value and a memoized error at once. Readers consult the failure
//! map first; writing one map never touches the other.

use crate::config::CacheConfig;
use crate::stats::{CacheStats, Counters};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct Entry<T> {
    value: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// In-memory cache mapping string keys to values with expiry, plus memoized failures
///
/// Expiry is checked lazily on every read; expired entries behave as absent
/// until [`TtlCache::purge_expired`] reclaims them. Locks are never held
/// across an `.await`, so the cache can be shared through an `Arc` between
/// tasks.
///
/// # Examples
///
/// ```
/// use lodestone_cache::{CacheConfig, TtlCache};
///
/// let cache: TtlCache<String, String> = TtlCache::new(CacheConfig::default());
/// cache.set("identity:notch", "069a79f444e94726a5befca90e38aaf5".to_string());
/// assert!(cache.has("identity:notch"));
///
/// cache.remember_failure("identity:nobody", "not found".to_string());
/// assert!(cache.has_failure("identity:nobody"));
/// assert!(!cache.has("identity:nobody"));
/// ```
#[derive(Debug)]
pub struct TtlCache<V, E> {
    config: CacheConfig,
    entries: RwLock<HashMap<String, Entry<V>>>,
    failures: RwLock<HashMap<String, Entry<E>>>,
    counters: Counters,
}

impl<V, E> TtlCache<V, E> {
    /// Create an empty cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Instance name from the configuration
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Store a value under the default TTL
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Store a value under an explicit TTL, replacing any previous value
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), Entry::new(value, ttl));
    }

    /// Whether a live success entry exists
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Remove the success entry for a key
    pub fn delete(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Remove everything from both namespaces
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Memoize a failure under the default failure TTL
    pub fn remember_failure(&self, key: impl Into<String>, error: E) {
        self.remember_failure_with_ttl(key, error, self.config.failure_ttl);
    }

    /// Memoize a failure under an explicit TTL
    pub fn remember_failure_with_ttl(&self, key: impl Into<String>, error: E, ttl: Duration) {
        let key = key.into();
        tracing::debug!(cache = %self.config.name, key = %key, ttl = ?ttl, "Remembering failure");
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Entry::new(error, ttl));
    }

    /// Whether a live failure is memoized for a key
    pub fn has_failure(&self, key: &str) -> bool {
        let now = Instant::now();
        self.failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Drop the memoized failure for a key
    pub fn forget_failure(&self, key: &str) -> bool {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Live success keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remove expired entries from both namespaces, returning how many went
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();

        let purged_entries = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let before = entries.len();
            entries.retain(|_, entry| entry.is_live(now));
            before - entries.len()
        };

        let purged_failures = {
            let mut failures = self.failures.write().unwrap_or_else(PoisonError::into_inner);
            let before = failures.len();
            failures.retain(|_, entry| entry.is_live(now));
            before - failures.len()
        };

        let purged = purged_entries + purged_failures;
        self.counters.record_sweep(purged);
        purged
    }

    /// Snapshot of the cache's counters and sizes
    pub fn stats(&self) -> CacheStats {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        let failures = self
            .failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        self.counters
            .snapshot(&self.config.name, entries, failures)
    }
}

impl<V: Clone, E> TtlCache<V, E> {
    /// Get a live value
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let value = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());

        match value {
            Some(_) => self.counters.record_hit(),
            None => self.counters.record_miss(),
        }
        value
    }
}

impl<V, E: Clone> TtlCache<V, E> {
    /// Get a live memoized failure
    pub fn get_failure(&self, key: &str) -> Option<E> {
        let now = Instant::now();
        let error = self
            .failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());

        if error.is_some() {
            self.counters.record_failure_hit();
        }
        error
    }
}
