//! End-to-end resolution tests over a SQLite store and mock upstreams

use lodestone_domain::traits::EntryStore;
use lodestone_domain::{IdentityId, PlayerName};
use lodestone_resolver::{IdentityRef, ResolveError, Resolver, ResolverConfig};
use lodestone_store::SqliteStore;
use lodestone_upstream::{MockIdentitySource, MockProfileSource, UpstreamError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::advance;
use uuid::Uuid;

const NOTCH: &str = "069a79f444e94726a5befca90e38aaf5";
const JEB: &str = "853c80ef3c3749fdaa49938b674adae6";
const PROFILE: &str = "4f1d8d56-1a89-4e56-9c1d-23b0b7e3a5a1";

fn name(s: &str) -> PlayerName {
    PlayerName::new(s).unwrap()
}

fn profile_id() -> Uuid {
    Uuid::parse_str(PROFILE).unwrap()
}

fn profile_document() -> Value {
    json!({
        "success": true,
        "profile": {
            "profile_id": PROFILE,
            "members": {
                NOTCH: {
                    "mining_core": {
                        "experience": 400000,
                        "nodes": {"special_0": 7, "mining_speed": 50},
                        "powder_mithril": 1000,
                        "powder_spent_mithril": 250,
                        "powder_gemstone": 10
                    }
                }
            }
        }
    })
}

fn resolver(
    identities: &MockIdentitySource,
    profiles: &MockProfileSource,
) -> Resolver<SqliteStore> {
    Resolver::new(
        SqliteStore::new(":memory:").unwrap(),
        Arc::new(identities.clone()),
        Arc::new(profiles.clone()),
        &ResolverConfig::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_resolutions_share_one_call() {
    let identities = MockIdentitySource::new()
        .with_identity(NOTCH, "Notch")
        .with_delay(Duration::from_secs(1));
    let profiles = MockProfileSource::new();
    let resolver = Arc::new(resolver(&identities, &profiles));

    let mut handles = Vec::new();
    for spelling in ["Notch", "notch", "NOTCH", "nOtCh", "Notch", "notch"] {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move { resolver.identity(&name(spelling)).await }));
    }

    for handle in handles {
        let identity = handle.await.unwrap().unwrap();
        assert_eq!(identity.id.as_str(), NOTCH);
    }
    assert_eq!(identities.call_count(), 1);
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let identities = MockIdentitySource::new().with_identity(NOTCH, "Notch");
    let resolver = resolver(&identities, &MockProfileSource::new());

    let first = resolver.identity(&name("Notch")).await.unwrap();
    let second = resolver.identity(&name("notch")).await.unwrap();
    let by_id = resolver
        .identity_by_id(&IdentityId::parse(NOTCH).unwrap())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first, by_id);
    assert_eq!(identities.call_count(), 1);
}

#[tokio::test]
async fn test_identity_is_persisted_to_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lodestone.db");
    let identities = MockIdentitySource::new().with_identity(NOTCH, "Notch");

    {
        let resolver = Resolver::new(
            SqliteStore::new(&path).unwrap(),
            Arc::new(identities.clone()),
            Arc::new(MockProfileSource::new()),
            &ResolverConfig::default(),
        );
        resolver.identity(&name("Notch")).await.unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    let stored = store.find_by_name(&name("NOTCH")).unwrap().unwrap();
    assert_eq!(stored.id.as_str(), NOTCH);

    // A fresh resolver answers from the store without any upstream call
    let fresh = MockIdentitySource::new();
    let resolver = Resolver::new(
        store,
        Arc::new(fresh.clone()),
        Arc::new(MockProfileSource::new()),
        &ResolverConfig::default(),
    );
    assert_eq!(resolver.identity(&name("notch")).await.unwrap(), stored);
    assert_eq!(fresh.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_memoized_not_found_expires() {
    let identities = MockIdentitySource::new();
    let resolver = resolver(&identities, &MockProfileSource::new());

    let err = resolver.identity(&name("Ghost")).await.unwrap_err();
    assert_eq!(err, ResolveError::NotFound { name: "Ghost".into() });

    advance(Duration::from_secs(3_599)).await;
    assert_eq!(resolver.identity(&name("ghost")).await.unwrap_err(), err);
    assert_eq!(identities.call_count(), 1);

    // The player shows up upstream; once the failure expires it resolves
    identities.add_identity(JEB, "Ghost");
    advance(Duration::from_secs(2)).await;
    let identity = resolver.identity(&name("Ghost")).await.unwrap();
    assert_eq!(identity.id.as_str(), JEB);
    assert_eq!(identities.call_count(), 2);
}

#[tokio::test]
async fn test_profiles_by_name() {
    let identities = MockIdentitySource::new().with_identity(NOTCH, "Notch");
    let profiles = MockProfileSource::new();
    profiles.add_profiles(
        NOTCH,
        json!({"success": true, "profiles": [
            {"profile_id": PROFILE, "cute_name": "Papaya", "selected": true},
            {"profile_id": "a9b3c1d2e3f4a5b6c7d8e9f0a1b2c3d4", "cute_name": "Kiwi",
             "game_mode": "stranded", "selected": false}
        ]}),
    );
    let resolver = resolver(&identities, &profiles);

    let list = resolver
        .profiles(&IdentityRef::Name(name("Notch")))
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].profile_id, profile_id());
    assert_eq!(list[1].mode.as_str(), "stranded");
}

#[tokio::test]
async fn test_unknown_profile_is_distinct_from_transport_failure() {
    let identities = MockIdentitySource::new();
    let profiles = MockProfileSource::new();
    let resolver = resolver(&identities, &profiles);

    profiles.add_profile(PROFILE, json!({"success": true, "profile": null}));
    let err = resolver.profile(profile_id()).await.unwrap_err();
    assert!(matches!(err, ResolveError::NonexistentProfile { .. }));

    // Not memoized, so the next call sees the upstream failing outright
    profiles.add_profile_error(
        PROFILE,
        UpstreamError::Status {
            status: 503,
            cause: "Service Unavailable".into(),
        },
    );
    let err = resolver.profile(profile_id()).await.unwrap_err();
    assert_eq!(
        err,
        ResolveError::Transport {
            status: Some(503),
            cause: "Service Unavailable".into()
        }
    );
    assert_eq!(profiles.call_count(), 2);
}

#[tokio::test]
async fn test_member_and_metrics() {
    let identities = MockIdentitySource::new().with_identity(NOTCH, "Notch");
    let profiles = MockProfileSource::new();
    profiles.add_profile(PROFILE, profile_document());
    let resolver = resolver(&identities, &profiles);
    let notch = IdentityId::parse(NOTCH).unwrap();

    let member = resolver.member(profile_id(), &notch).await.unwrap();
    assert_eq!(member["mining_core"]["experience"], 400000);

    let metrics = resolver
        .member_metrics_by_name(&name("Notch"), profile_id())
        .await
        .unwrap();
    // 400000 exceeds 347000 but not 557000
    assert_eq!(metrics.level, 7);
    // Table entry 16 plus thresholds 1, 5 and 7
    assert_eq!(metrics.budget, 19);
    assert_eq!(metrics.resources[0].total, 1250);
    assert_eq!(metrics.resources[1].owned, 10);
    assert_eq!(metrics.resources[2].total, 0);
    assert_eq!(profiles.call_count(), 1);
}

#[tokio::test]
async fn test_missing_member_is_never_cached() {
    let identities = MockIdentitySource::new();
    let profiles = MockProfileSource::new();
    profiles.add_profile(PROFILE, profile_document());
    let resolver = resolver(&identities, &profiles);
    let jeb = IdentityId::parse(JEB).unwrap();

    let err = resolver.member(profile_id(), &jeb).await.unwrap_err();
    assert!(matches!(err, ResolveError::Membership { .. }));

    let details = &resolver.stats()[2];
    assert_eq!(details.entries, 1);
    assert_eq!(details.failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_retried() {
    let identities = MockIdentitySource::new();
    let profiles = MockProfileSource::new().with_delay(Duration::from_secs(60));
    profiles.add_profile(PROFILE, profile_document());
    let resolver = resolver(&identities, &profiles);

    let err = resolver.profile(profile_id()).await.unwrap_err();
    assert!(matches!(err, ResolveError::Transport { status: None, .. }));

    resolver.profile(profile_id()).await.unwrap_err();
    assert_eq!(profiles.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_sweepers_purge_expired_entries() {
    let identities = MockIdentitySource::new().with_identity(NOTCH, "Notch");
    let mut config = ResolverConfig::default();
    config.cache.profile_lists.sweep_interval_secs = Some(0);
    config.cache.profile_details.sweep_interval_secs = Some(0);
    config.cache.identities.sweep_interval_secs = Some(60);
    config.cache.identities.ttl_secs = Some(30);

    let resolver = Resolver::new(
        SqliteStore::new(":memory:").unwrap(),
        Arc::new(identities),
        Arc::new(MockProfileSource::new()),
        &config,
    );
    assert_eq!(resolver.start_sweepers(), 1);
    assert_eq!(resolver.start_sweepers(), 1);
    tokio::task::yield_now().await;

    resolver.identity(&name("Notch")).await.unwrap();
    assert_eq!(resolver.stats()[0].entries, 1);

    advance(Duration::from_secs(61)).await;
    tokio::task::yield_now().await;

    let stats = &resolver.stats()[0];
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.purged, 1);
    assert_eq!(stats.sweep_count, 1);
}
