//! Configuration for cache instances
//!
//! Each cache instance carries its own success TTL, failure TTL and sweep
//! interval, with presets for the three entity kinds Lodestone resolves.

use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Configuration for one [`crate::TtlCache`] instance
///
/// # Examples
///
/// ```
/// use lodestone_cache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::default();
/// assert_eq!(config.default_ttl, Duration::from_secs(6 * 3600));
///
/// let config = CacheConfig::identities();
/// assert_eq!(config.failure_ttl, Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Name used in logs and stats
    pub name: String,

    /// TTL applied by `set`
    pub default_ttl: Duration,

    /// TTL applied by `remember_failure`
    pub failure_ttl: Duration,

    /// How often the sweep worker purges expired entries; `None` disables it
    pub sweep_interval: Option<Duration>,
}

impl Default for CacheConfig {
    /// - Success: 6 hours
    /// - Failure: 5 minutes
    /// - Sweep: every 30 minutes
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            default_ttl: Duration::from_secs(6 * HOUR),
            failure_ttl: Duration::from_secs(5 * MINUTE),
            sweep_interval: Some(Duration::from_secs(30 * MINUTE)),
        }
    }
}

impl CacheConfig {
    /// Identity lookups by name or id
    ///
    /// - Success: 1 hour
    /// - Failure: 1 hour
    /// - Sweep: daily
    pub fn identities() -> Self {
        Self {
            name: "identities".to_string(),
            default_ttl: Duration::from_secs(HOUR),
            failure_ttl: Duration::from_secs(HOUR),
            sweep_interval: Some(Duration::from_secs(DAY)),
        }
    }

    /// Profile lists per identity
    ///
    /// - Success: 6 hours
    /// - Failure: 10 minutes
    /// - Sweep: every 8 hours
    pub fn profile_lists() -> Self {
        Self {
            name: "profile_lists".to_string(),
            default_ttl: Duration::from_secs(6 * HOUR),
            failure_ttl: Duration::from_secs(10 * MINUTE),
            sweep_interval: Some(Duration::from_secs(8 * HOUR)),
        }
    }

    /// Full profile documents
    ///
    /// - Success: 2 hours
    /// - Failure: 10 minutes
    /// - Sweep: every 30 minutes
    pub fn profile_details() -> Self {
        Self {
            name: "profile_details".to_string(),
            default_ttl: Duration::from_secs(2 * HOUR),
            failure_ttl: Duration::from_secs(10 * MINUTE),
            sweep_interval: Some(Duration::from_secs(30 * MINUTE)),
        }
    }

    /// Rename the instance
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Disable the periodic sweep
    pub fn without_sweep(mut self) -> Self {
        self.sweep_interval = None;
        self
    }
}
