//! Identity resolution
//!
//! Lookup order, first hit wins:
//!
//! 1. Entry store (no cache interaction on a hit)
//! 2. Failure cache
//! 3. Success cache
//! 4. Identity upstream, coalesced per key
//!
//! A non-success upstream answer means the identity does not exist and is
//! memoized as [`ResolveError::NotFound`]. Malformed bodies are rejected
//! without caching. Accepted identities are persisted, then cached.

use crate::{call_upstream, ResolveError};
use lodestone_cache::{InFlight, TtlCache};
use lodestone_domain::traits::EntryStore;
use lodestone_domain::{Identity, IdentityId, PlayerName};
use lodestone_gatekeeper::validate_identity;
use lodestone_upstream::{IdentitySource, UpstreamError};
use std::fmt::Display;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Cache key for a name lookup
pub fn name_key(name: &PlayerName) -> String {
    format!("identity:{}", name.normalized())
}

/// Cache key for an id lookup
pub fn id_key(id: &IdentityId) -> String {
    format!("identity-id:{}", id)
}

/// Resolves identities by name or id
pub struct IdentityResolver<S: EntryStore> {
    store: Arc<Mutex<S>>,
    source: Arc<dyn IdentitySource>,
    cache: Arc<TtlCache<Identity, ResolveError>>,
    in_flight: InFlight<Identity, ResolveError>,
    timeout: Duration,
}

enum Lookup<'a> {
    Name(&'a PlayerName),
    Id(&'a IdentityId),
}

impl Lookup<'_> {
    fn label(&self) -> String {
        match self {
            Lookup::Name(name) => name.to_string(),
            Lookup::Id(id) => id.to_string(),
        }
    }
}

impl<S> IdentityResolver<S>
where
    S: EntryStore,
    S::Error: Display,
{
    /// Create a resolver over a shared store, an upstream and a cache
    pub fn new(
        store: Arc<Mutex<S>>,
        source: Arc<dyn IdentitySource>,
        cache: Arc<TtlCache<Identity, ResolveError>>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            source,
            cache,
            in_flight: InFlight::new(),
            timeout,
        }
    }

    /// The identity cache
    pub fn cache(&self) -> &Arc<TtlCache<Identity, ResolveError>> {
        &self.cache
    }

    /// Resolve an identity by name, ignoring case
    pub async fn resolve(&self, name: &PlayerName) -> Result<Identity, ResolveError> {
        let stored = self.with_store(|store| store.find_by_name(name))?;
        if let Some(identity) = stored {
            debug!(name = %name, "Identity found in store");
            return Ok(identity);
        }

        self.resolve_uncached(Lookup::Name(name), name_key(name)).await
    }

    /// Resolve an identity by id
    pub async fn resolve_by_id(&self, id: &IdentityId) -> Result<Identity, ResolveError> {
        let stored = self.with_store(|store| store.find_by_id(id))?;
        if let Some(identity) = stored {
            debug!(id = %id, "Identity found in store");
            return Ok(identity);
        }

        self.resolve_uncached(Lookup::Id(id), id_key(id)).await
    }

    async fn resolve_uncached(&self, lookup: Lookup<'_>, key: String) -> Result<Identity, ResolveError> {
        if let Some(cached) = self.check_cache(&key) {
            return cached;
        }

        self.in_flight
            .run(&key, || async {
                // Another leader may have finished between our check and now
                if let Some(cached) = self.check_cache(&key) {
                    return cached;
                }
                self.fetch(&lookup, &key).await
            })
            .await
    }

    fn check_cache(&self, key: &str) -> Option<Result<Identity, ResolveError>> {
        if let Some(error) = self.cache.get_failure(key) {
            warn!(key = %key, "Previously failed to resolve identity: {}", error);
            return Some(Err(error));
        }
        if let Some(identity) = self.cache.get(key) {
            debug!(key = %key, "Identity cache hit");
            return Some(Ok(identity));
        }
        debug!(key = %key, "Identity cache miss");
        None
    }

    async fn fetch(&self, lookup: &Lookup<'_>, key: &str) -> Result<Identity, ResolveError> {
        info!("Calling identity upstream for {}", lookup.label());

        let response = match lookup {
            Lookup::Name(name) => {
                call_upstream(self.timeout, self.source.lookup_name(name.as_str())).await
            }
            Lookup::Id(id) => call_upstream(self.timeout, self.source.lookup_id(id.as_str())).await,
        };

        let body = match response {
            Ok(body) => body,
            Err(UpstreamError::Status { status, cause }) => {
                let err = ResolveError::NotFound {
                    name: lookup.label(),
                };
                warn!(status, cause = %cause, "Identity {} not found upstream", lookup.label());
                self.cache.remember_failure(key, err.clone());
                return Err(err);
            }
            Err(other) => return Err(ResolveError::from_upstream(other)),
        };

        let identity = validate_identity(&body).map_err(|violations| {
            warn!("Identity upstream response for {} does not match schema", lookup.label());
            ResolveError::Validation { violations }
        })?;

        // Not cached unless persisted
        self.with_store(|store| store.insert(identity.clone()))?;

        self.cache.set(key, identity.clone());
        info!(id = %identity.id, name = %identity.name, "Resolved identity");
        Ok(identity)
    }

    fn with_store<T>(
        &self,
        op: impl FnOnce(&mut S) -> Result<T, S::Error>,
    ) -> Result<T, ResolveError> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut store).map_err(|e| {
            error!("Store error: {}", e);
            ResolveError::Store(e.to_string())
        })
    }
}
