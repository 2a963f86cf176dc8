//! Profile-document resolution and member lookup

use crate::{call_upstream, ResolveError};
use lodestone_cache::{InFlight, TtlCache};
use lodestone_domain::{IdentityId, MemberMetrics, ProfileDetail};
use lodestone_gatekeeper::validate_profile_detail;
use lodestone_upstream::{ProfileSource, UpstreamError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Cache key for a profile document
pub fn profile_key(profile_id: &Uuid) -> String {
    format!("profile:{}", profile_id)
}

/// Resolves profile documents by id
pub struct ProfileDetailResolver {
    source: Arc<dyn ProfileSource>,
    cache: Arc<TtlCache<ProfileDetail, ResolveError>>,
    in_flight: InFlight<ProfileDetail, ResolveError>,
    timeout: Duration,
}

impl ProfileDetailResolver {
    /// Create a resolver over a profile upstream and its cache
    pub fn new(
        source: Arc<dyn ProfileSource>,
        cache: Arc<TtlCache<ProfileDetail, ResolveError>>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            cache,
            in_flight: InFlight::new(),
            timeout,
        }
    }

    /// The profile-document cache
    pub fn cache(&self) -> &Arc<TtlCache<ProfileDetail, ResolveError>> {
        &self.cache
    }

    /// Resolve a profile document
    ///
    /// A successful response without a valid document means upstream has
    /// no such profile: [`ResolveError::NonexistentProfile`], not memoized.
    /// Non-success statuses are memoized as [`ResolveError::Transport`].
    pub async fn resolve(&self, profile_id: Uuid) -> Result<ProfileDetail, ResolveError> {
        let key = profile_key(&profile_id);
        if let Some(cached) = self.check_cache(&key) {
            return cached;
        }

        self.in_flight
            .run(&key, || async {
                if let Some(cached) = self.check_cache(&key) {
                    return cached;
                }
                self.fetch(profile_id, &key).await
            })
            .await
    }

    /// Resolve the payload of one member of a profile
    ///
    /// An absent member is reported as [`ResolveError::Membership`] and
    /// never cached; the document itself stays cached.
    pub async fn resolve_member(
        &self,
        profile_id: Uuid,
        identity_id: &IdentityId,
    ) -> Result<Value, ResolveError> {
        let detail = self.resolve(profile_id).await?;
        match detail.member(identity_id) {
            Some(member) => Ok(member.clone()),
            None => {
                debug!(profile_id = %profile_id, identity_id = %identity_id, "Member not in profile");
                Err(ResolveError::Membership {
                    identity_id: identity_id.clone(),
                    profile_id,
                })
            }
        }
    }

    /// Derive metrics for one member of a profile
    pub async fn member_metrics(
        &self,
        profile_id: Uuid,
        identity_id: &IdentityId,
    ) -> Result<MemberMetrics, ResolveError> {
        let member = self.resolve_member(profile_id, identity_id).await?;
        MemberMetrics::from_member(&member).map_err(|e| ResolveError::Metrics(e.to_string()))
    }

    fn check_cache(&self, key: &str) -> Option<Result<ProfileDetail, ResolveError>> {
        if let Some(error) = self.cache.get_failure(key) {
            warn!(key = %key, "Previously failed to fetch profile: {}", error);
            return Some(Err(error));
        }
        if let Some(detail) = self.cache.get(key) {
            debug!(key = %key, "Profile cache hit");
            return Some(Ok(detail));
        }
        debug!(key = %key, "Profile cache miss");
        None
    }

    async fn fetch(&self, profile_id: Uuid, key: &str) -> Result<ProfileDetail, ResolveError> {
        info!(profile_id = %profile_id, "Fetching profile");

        let envelope = call_upstream(self.timeout, self.source.profile(&profile_id.to_string()))
            .await
            .map_err(|e| {
                let err = ResolveError::from_upstream(e.clone());
                if let UpstreamError::Status { status, .. } = e {
                    warn!(status, profile_id = %profile_id, "Profile request failed: {}", err);
                    self.cache.remember_failure(key, err.clone());
                }
                err
            })?;

        let detail = validate_profile_detail(&envelope).map_err(|violations| {
            warn!(profile_id = %profile_id, "No valid profile in response: {}", violations);
            ResolveError::NonexistentProfile {
                profile_id,
                violations,
            }
        })?;

        self.cache.set(key, detail.clone());
        info!(profile_id = %profile_id, members = detail.members.len(), "Resolved profile");
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_cache::CacheConfig;
    use lodestone_upstream::MockProfileSource;
    use serde_json::json;

    const NOTCH: &str = "069a79f444e94726a5befca90e38aaf5";
    const JEB: &str = "853c80ef3c3749fdaa49938b674adae6";
    const PROFILE: &str = "4f1d8d56-1a89-4e56-9c1d-23b0b7e3a5a1";

    fn profile_id() -> Uuid {
        Uuid::parse_str(PROFILE).unwrap()
    }

    fn resolver(source: MockProfileSource) -> ProfileDetailResolver {
        ProfileDetailResolver::new(
            Arc::new(source),
            Arc::new(TtlCache::new(CacheConfig::profile_details().without_sweep())),
            Duration::from_secs(5),
        )
    }

    fn document() -> Value {
        json!({
            "success": true,
            "profile": {
                "profile_id": PROFILE,
                "members": {
                    NOTCH: {
                        "mining_core": {
                            "experience": 150000,
                            "nodes": {"special_0": 4, "toggle_mining_speed": false},
                            "powder_mithril": 500,
                            "powder_spent_mithril": 1500
                        }
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_resolve_and_cache() {
        let source = MockProfileSource::new();
        source.add_profile(PROFILE, document());
        let resolver = resolver(source.clone());

        let detail = resolver.resolve(profile_id()).await.unwrap();
        assert_eq!(detail.profile_id, profile_id());
        assert_eq!(detail.members.len(), 1);

        resolver.resolve(profile_id()).await.unwrap();
        assert_eq!(source.call_count(), 1);
        assert!(resolver.cache().has(&profile_key(&profile_id())));
    }

    #[tokio::test]
    async fn test_nonexistent_profile_is_not_memoized() {
        let source = MockProfileSource::new();
        source.add_profile(PROFILE, json!({"success": true, "profile": null}));
        let resolver = resolver(source.clone());

        let err = resolver.resolve(profile_id()).await.unwrap_err();
        assert!(matches!(err, ResolveError::NonexistentProfile { profile_id: id, .. } if id == profile_id()));
        assert!(!resolver.cache().has_failure(&profile_key(&profile_id())));

        resolver.resolve(profile_id()).await.unwrap_err();
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_status_failure_is_transport_and_memoized() {
        let source = MockProfileSource::new();
        source.add_profile_error(
            PROFILE,
            UpstreamError::Status {
                status: 429,
                cause: "Key throttle".into(),
            },
        );
        let resolver = resolver(source.clone());

        let err = resolver.resolve(profile_id()).await.unwrap_err();
        assert_eq!(
            err,
            ResolveError::Transport {
                status: Some(429),
                cause: "Key throttle".into()
            }
        );
        assert_eq!(resolver.resolve(profile_id()).await.unwrap_err(), err);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_member() {
        let source = MockProfileSource::new();
        source.add_profile(PROFILE, document());
        let resolver = resolver(source.clone());
        let jeb = IdentityId::parse(JEB).unwrap();

        let err = resolver.resolve_member(profile_id(), &jeb).await.unwrap_err();
        assert_eq!(
            err,
            ResolveError::Membership {
                identity_id: jeb.clone(),
                profile_id: profile_id()
            }
        );
        assert_eq!(resolver.cache().keys(), vec![profile_key(&profile_id())]);
        assert!(!resolver.cache().has_failure(&profile_key(&profile_id())));

        // Nothing remembered about the absence; the document is served from cache
        resolver.resolve_member(profile_id(), &jeb).await.unwrap_err();
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_member_metrics() {
        let source = MockProfileSource::new();
        source.add_profile(PROFILE, document());
        let resolver = resolver(source);
        let notch = IdentityId::parse(NOTCH).unwrap();

        let metrics = resolver.member_metrics(profile_id(), &notch).await.unwrap();
        assert_eq!(metrics.level, 5);
        assert_eq!(metrics.budget, 12);
        assert_eq!(metrics.node_levels.len(), 1);
        assert_eq!(metrics.resources[0].total, 2000);
    }

    #[tokio::test]
    async fn test_member_metrics_bad_counter() {
        let source = MockProfileSource::new();
        source.add_profile(
            PROFILE,
            json!({"profile": {"profile_id": PROFILE, "members": {
                NOTCH: {"mining_core": {"powder_mithril": "lots"}}
            }}}),
        );
        let resolver = resolver(source);
        let notch = IdentityId::parse(NOTCH).unwrap();

        let err = resolver.member_metrics(profile_id(), &notch).await.unwrap_err();
        assert!(matches!(err, ResolveError::Metrics(_)));
    }
}
