//! Lodestone Resolver
//!
//! Read-through resolution of identities, profile lists and profile
//! documents.
//!
//! # Architecture
//!
//! ```text
//! name ──► EntryStore ──► TtlCache ──► IdentitySource ──► Gatekeeper ──► store + cache
//!                                             │
//! profiles ──► TtlCache ──► identity ──► ProfileSource ──► Gatekeeper ──► cache
//! profile  ──► TtlCache ──────────────► ProfileSource ──► Gatekeeper ──► cache
//! ```
//!
//! Each resolver checks its failure cache before its success cache, so a
//! memoized upstream failure is re-raised without a network call until it
//! expires. Concurrent misses for one key are coalesced into a single
//! upstream call.
//!
//! # Example Usage
//!
//! ```no_run
//! use lodestone_resolver::{Resolver, ResolverConfig};
//! use lodestone_domain::PlayerName;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResolverConfig::from_file("lodestone.toml")?;
//! let resolver = Resolver::from_config(&config)?;
//! resolver.start_sweepers();
//!
//! let name = PlayerName::new("Notch")?;
//! let identity = resolver.identity(&name).await?;
//! let profiles = resolver.profiles(&name.into()).await?;
//!
//! println!("{} has {} profiles", identity.name, profiles.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod identity;
pub mod profile;
pub mod profiles;

pub use config::{ConfigError, ResolverConfig};
pub use error::ResolveError;
pub use identity::IdentityResolver;
pub use profile::ProfileDetailResolver;
pub use profiles::{IdentityRef, ProfileListResolver};

use lodestone_cache::{CacheStats, SweepWorker, TtlCache};
use lodestone_domain::traits::EntryStore;
use lodestone_domain::{Identity, IdentityId, MemberMetrics, PlayerName, ProfileDetail, ProfileSummary};
use lodestone_store::SqliteStore;
use lodestone_upstream::{IdentityClient, IdentitySource, ProfileClient, ProfileSource, UpstreamError};
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

/// Bound an upstream call by `timeout`
///
/// Elapsing surfaces as a communication failure, which is never memoized.
pub(crate) async fn call_upstream<F>(timeout: Duration, call: F) -> Result<Value, UpstreamError>
where
    F: Future<Output = Result<Value, UpstreamError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::Communication(format!(
            "Upstream request timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// All three resolvers wired to one store and two upstreams
pub struct Resolver<S: EntryStore> {
    identities: Arc<IdentityResolver<S>>,
    profile_lists: ProfileListResolver<S>,
    profile_details: ProfileDetailResolver,
    sweepers: Mutex<Vec<JoinHandle<()>>>,
}

impl<S> Resolver<S>
where
    S: EntryStore,
    S::Error: Display,
{
    /// Wire resolvers over the given store and sources
    ///
    /// Caches are built from `config`; sweeping starts only once
    /// [`Resolver::start_sweepers`] is called.
    pub fn new(
        store: S,
        identity_source: Arc<dyn IdentitySource>,
        profile_source: Arc<dyn ProfileSource>,
        config: &ResolverConfig,
    ) -> Self {
        let timeout = config.timeout();
        let store = Arc::new(Mutex::new(store));

        let identities = Arc::new(IdentityResolver::new(
            store,
            identity_source,
            Arc::new(TtlCache::new(config.identities_cache())),
            timeout,
        ));
        let profile_lists = ProfileListResolver::new(
            identities.clone(),
            profile_source.clone(),
            Arc::new(TtlCache::new(config.profile_lists_cache())),
            timeout,
        );
        let profile_details = ProfileDetailResolver::new(
            profile_source,
            Arc::new(TtlCache::new(config.profile_details_cache())),
            timeout,
        );

        Self {
            identities,
            profile_lists,
            profile_details,
            sweepers: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a sweep task per cache that has sweeping enabled
    ///
    /// Must be called from within a tokio runtime. Calling it again is a
    /// no-op while the first set of tasks is alive. Returns the number of
    /// tasks running.
    pub fn start_sweepers(&self) -> usize {
        let mut sweepers = self.sweepers.lock().unwrap_or_else(PoisonError::into_inner);
        if sweepers.is_empty() {
            sweepers.extend(SweepWorker::spawn(self.identities.cache().clone()));
            sweepers.extend(SweepWorker::spawn(self.profile_lists.cache().clone()));
            sweepers.extend(SweepWorker::spawn(self.profile_details.cache().clone()));
            info!(count = sweepers.len(), "Started cache sweepers");
        }
        sweepers.len()
    }

    /// Resolve an identity by name
    pub async fn identity(&self, name: &PlayerName) -> Result<Identity, ResolveError> {
        self.identities.resolve(name).await
    }

    /// Resolve an identity by id
    pub async fn identity_by_id(&self, id: &IdentityId) -> Result<Identity, ResolveError> {
        self.identities.resolve_by_id(id).await
    }

    /// Resolve the profiles of an identity
    pub async fn profiles(&self, target: &IdentityRef) -> Result<Vec<ProfileSummary>, ResolveError> {
        self.profile_lists.resolve(target).await
    }

    /// Resolve a profile document
    pub async fn profile(&self, profile_id: Uuid) -> Result<ProfileDetail, ResolveError> {
        self.profile_details.resolve(profile_id).await
    }

    /// Resolve one member's payload within a profile
    pub async fn member(&self, profile_id: Uuid, identity_id: &IdentityId) -> Result<Value, ResolveError> {
        self.profile_details.resolve_member(profile_id, identity_id).await
    }

    /// Derive metrics for one member of a profile
    pub async fn member_metrics(
        &self,
        profile_id: Uuid,
        identity_id: &IdentityId,
    ) -> Result<MemberMetrics, ResolveError> {
        self.profile_details.member_metrics(profile_id, identity_id).await
    }

    /// Resolve a player by name, then derive their metrics within a profile
    pub async fn member_metrics_by_name(
        &self,
        name: &PlayerName,
        profile_id: Uuid,
    ) -> Result<MemberMetrics, ResolveError> {
        let identity = self.identity(name).await?;
        self.member_metrics(profile_id, &identity.id).await
    }

    /// Snapshot of every cache's statistics
    pub fn stats(&self) -> Vec<CacheStats> {
        vec![
            self.identities.cache().stats(),
            self.profile_lists.cache().stats(),
            self.profile_details.cache().stats(),
        ]
    }
}

impl Resolver<SqliteStore> {
    /// Build a resolver with a SQLite store and HTTP upstreams from config
    ///
    /// Without a configured store path the store lives in memory.
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ConfigError> {
        let store = match &config.store.path {
            Some(path) => SqliteStore::new(path),
            None => SqliteStore::new(":memory:"),
        }
        .map_err(|e| ConfigError::Store(e.to_string()))?;

        let timeout = config.timeout();
        let identity_client = IdentityClient::new(config.upstream.identity_url.as_str(), timeout)
            .map_err(|e| ConfigError::Upstream(e.to_string()))?;
        let profile_client = ProfileClient::new(
            config.upstream.profile_url.as_str(),
            config.api_key(),
            timeout,
        )
        .map_err(|e| ConfigError::Upstream(e.to_string()))?;

        Ok(Self::new(
            store,
            Arc::new(identity_client),
            Arc::new(profile_client),
            config,
        ))
    }
}

impl<S: EntryStore> Drop for Resolver<S> {
    fn drop(&mut self) {
        let sweepers = self.sweepers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for handle in sweepers.drain(..) {
            handle.abort();
        }
    }
}
