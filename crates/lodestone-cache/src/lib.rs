//! Lodestone Cache
//!
//! In-memory caching primitives shared by the resolvers.
//!
//! # Overview
//!
//! - [`TtlCache`]: string-keyed values with per-entry expiry, plus a separate
//!   namespace memoizing recent failures under their own TTL
//! - [`SweepWorker`]: background task reclaiming expired entries
//! - [`InFlight`]: per-key coalescing so concurrent misses share one upstream call
//!
//! # Usage
//!
//! ```
//! use lodestone_cache::{CacheConfig, TtlCache};
//!
//! let cache: TtlCache<String, String> = TtlCache::new(CacheConfig::identities());
//!
//! cache.remember_failure("identity:nobody", "no such player".to_string());
//! assert!(cache.has_failure("identity:nobody"));
//! assert!(cache.get("identity:nobody").is_none());
//! ```
//!
//! ## Configuration Presets
//!
//! | Preset | Success TTL | Failure TTL | Sweep |
//! |--------|-------------|-------------|-------|
//! | `identities()` | 1 h | 1 h | 1 day |
//! | `profile_lists()` | 6 h | 10 min | 8 h |
//! | `profile_details()` | 2 h | 10 min | 30 min |
//! | `default()` | 6 h | 5 min | 30 min |
//!
//! Time is read from `tokio::time::Instant`, so tests can pause and advance
//! the clock.

#![warn(missing_docs)]

mod config;
mod inflight;
mod stats;
mod ttl;
mod worker;

pub use config::CacheConfig;
pub use inflight::InFlight;
pub use stats::CacheStats;
pub use ttl::TtlCache;
pub use worker::SweepWorker;
