//! Lodestone Domain Layer
//!
//! This crate contains the domain model shared by every other Lodestone crate:
//! the entities the resolvers hand out, the pure derived-metric computation,
//! and the trait boundary to the entry store.
//!
//! ## Key Concepts
//!
//! - **Identity**: canonical player record keyed by an opaque 32-hex id,
//!   resolvable by its human-readable name
//! - **Profile**: a game profile an identity belongs to, summarized in lists
//!   and fetched in detail with per-member payloads
//! - **Member metrics**: levels, budgets and resource balances derived from a
//!   member payload, never cached or persisted
//!
//! ## Architecture
//!
//! - No I/O, no async, no caching
//! - Infrastructure implementations live in other crates
//! - Trait definitions for the entry store boundary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod identity;
pub mod metrics;
pub mod profile;
pub mod traits;

// Re-exports for convenience
pub use identity::{Identity, IdentityId, PlayerName};
pub use metrics::{MemberMetrics, MetricsError, ResourceBalance, ResourceKind};
pub use profile::{GameMode, ProfileDetail, ProfileLabel, ProfileSummary};
