//! Profile-list resolution

use crate::identity::IdentityResolver;
use crate::{call_upstream, ResolveError};
use lodestone_cache::{InFlight, TtlCache};
use lodestone_domain::traits::EntryStore;
use lodestone_domain::{Identity, IdentityId, PlayerName, ProfileSummary};
use lodestone_gatekeeper::validate_profile_list;
use lodestone_upstream::{ProfileSource, UpstreamError};
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How the caller names the identity whose profiles are wanted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityRef {
    /// Player name, matched case-insensitively
    Name(PlayerName),
    /// Identity id
    Id(IdentityId),
}

impl IdentityRef {
    /// Cache key for this reference's profile list
    ///
    /// Names are at most 16 characters and ids always 32, so the two forms
    /// never share a key.
    pub fn cache_key(&self) -> String {
        match self {
            IdentityRef::Name(name) => format!("profiles:{}", name.normalized()),
            IdentityRef::Id(id) => format!("profiles:{}", id),
        }
    }
}

impl Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityRef::Name(name) => write!(f, "{}", name),
            IdentityRef::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<PlayerName> for IdentityRef {
    fn from(name: PlayerName) -> Self {
        IdentityRef::Name(name)
    }
}

impl From<IdentityId> for IdentityRef {
    fn from(id: IdentityId) -> Self {
        IdentityRef::Id(id)
    }
}

/// Resolves the profile list of an identity
pub struct ProfileListResolver<S: EntryStore> {
    identities: Arc<IdentityResolver<S>>,
    source: Arc<dyn ProfileSource>,
    cache: Arc<TtlCache<Vec<ProfileSummary>, ResolveError>>,
    in_flight: InFlight<Vec<ProfileSummary>, ResolveError>,
    timeout: Duration,
}

impl<S> ProfileListResolver<S>
where
    S: EntryStore,
    S::Error: Display,
{
    /// Create a profile-list resolver on top of an identity resolver
    pub fn new(
        identities: Arc<IdentityResolver<S>>,
        source: Arc<dyn ProfileSource>,
        cache: Arc<TtlCache<Vec<ProfileSummary>, ResolveError>>,
        timeout: Duration,
    ) -> Self {
        Self {
            identities,
            source,
            cache,
            in_flight: InFlight::new(),
            timeout,
        }
    }

    /// The profile-list cache
    pub fn cache(&self) -> &Arc<TtlCache<Vec<ProfileSummary>, ResolveError>> {
        &self.cache
    }

    /// Resolve the profiles of an identity
    ///
    /// Identity errors propagate as they are and are never memoized under
    /// the profile-list key.
    pub async fn resolve(&self, target: &IdentityRef) -> Result<Vec<ProfileSummary>, ResolveError> {
        let key = target.cache_key();
        if let Some(cached) = self.check_cache(&key) {
            return cached;
        }

        self.in_flight
            .run(&key, || async {
                if let Some(cached) = self.check_cache(&key) {
                    return cached;
                }
                let identity = self.identity(target).await?;
                self.fetch(&identity, &key).await
            })
            .await
    }

    async fn identity(&self, target: &IdentityRef) -> Result<Identity, ResolveError> {
        match target {
            IdentityRef::Name(name) => self.identities.resolve(name).await,
            IdentityRef::Id(id) => self.identities.resolve_by_id(id).await,
        }
    }

    fn check_cache(&self, key: &str) -> Option<Result<Vec<ProfileSummary>, ResolveError>> {
        if let Some(error) = self.cache.get_failure(key) {
            warn!(key = %key, "Previously failed to fetch profiles: {}", error);
            return Some(Err(error));
        }
        if let Some(profiles) = self.cache.get(key) {
            debug!(key = %key, "Profile list cache hit");
            return Some(Ok(profiles));
        }
        debug!(key = %key, "Profile list cache miss");
        None
    }

    async fn fetch(&self, identity: &Identity, key: &str) -> Result<Vec<ProfileSummary>, ResolveError> {
        info!(id = %identity.id, "Fetching profiles for {}", identity.name);

        let envelope = call_upstream(self.timeout, self.source.profiles(identity.id.as_str()))
            .await
            .map_err(|e| {
                let err = ResolveError::from_upstream(e.clone());
                if let UpstreamError::Status { status, .. } = e {
                    warn!(status, id = %identity.id, "Profile list request failed: {}", err);
                    self.cache.remember_failure(key, err.clone());
                }
                err
            })?;

        let profiles = validate_profile_list(&envelope).map_err(|violations| {
            warn!(id = %identity.id, "Profile list does not match schema: {}", violations);
            ResolveError::Validation { violations }
        })?;

        self.cache.set(key, profiles.clone());
        info!(id = %identity.id, count = profiles.len(), "Resolved profiles");
        Ok(profiles)
    }
}
