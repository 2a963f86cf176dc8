//! Deterministic in-memory sources for testing
//!
//! Both mocks answer from pre-registered bodies, count every call and can
//! be slowed down to exercise timeouts and request coalescing. Clones share
//! their responses and counters.

use crate::{IdentitySource, ProfileSource, UpstreamError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type Responses = Arc<Mutex<HashMap<String, Result<Value, UpstreamError>>>>;

fn not_found() -> UpstreamError {
    UpstreamError::Status {
        status: 404,
        cause: "Not Found".to_string(),
    }
}

fn lookup(responses: &Responses, key: &str) -> Result<Value, UpstreamError> {
    responses
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
        .unwrap_or_else(|| Err(not_found()))
}

fn insert(responses: &Responses, key: String, response: Result<Value, UpstreamError>) {
    responses
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, response);
}

#[derive(Debug, Clone, Default)]
struct CallCounter(Arc<Mutex<usize>>);

impl CallCounter {
    fn increment(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn get(&self) -> usize {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reset(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = 0;
    }
}

/// Mock identity source
///
/// Names are matched case-insensitively. Unregistered names and ids answer
/// with a 404 status error.
///
/// # Examples
///
/// ```
/// use lodestone_upstream::{IdentitySource, MockIdentitySource, UpstreamError};
///
/// # #[tokio::main]
/// # async fn main() {
/// let source = MockIdentitySource::new()
///     .with_identity("069a79f444e94726a5befca90e38aaf5", "Notch");
///
/// assert!(source.lookup_id("069a79f444e94726a5befca90e38aaf5").await.is_ok());
/// assert!(matches!(
///     source.lookup_name("nobody").await,
///     Err(UpstreamError::Status { status: 404, .. })
/// ));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockIdentitySource {
    by_name: Responses,
    by_id: Responses,
    calls: CallCounter,
    delay: Option<Duration>,
}

impl MockIdentitySource {
    /// Create a source that knows nobody
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity, answerable by name and by id
    pub fn with_identity(self, id: &str, name: &str) -> Self {
        self.add_identity(id, name);
        self
    }

    /// Delay every answer, e.g. to hold concurrent callers in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Register an identity, answerable by name and by id
    pub fn add_identity(&self, id: &str, name: &str) {
        let body = json!({ "id": id, "name": name });
        insert(&self.by_name, name.to_lowercase(), Ok(body.clone()));
        insert(&self.by_id, id.to_string(), Ok(body));
    }

    /// Answer a name lookup with an arbitrary body
    pub fn add_name_response(&self, name: &str, body: Value) {
        insert(&self.by_name, name.to_lowercase(), Ok(body));
    }

    /// Answer a name lookup with an error
    pub fn add_name_error(&self, name: &str, error: UpstreamError) {
        insert(&self.by_name, name.to_lowercase(), Err(error));
    }

    /// Get the number of lookups made, by name or id
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.calls.reset();
    }

    async fn answer(&self, responses: &Responses, key: &str) -> Result<Value, UpstreamError> {
        self.calls.increment();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        lookup(responses, key)
    }
}

#[async_trait]
impl IdentitySource for MockIdentitySource {
    async fn lookup_name(&self, name: &str) -> Result<Value, UpstreamError> {
        self.answer(&self.by_name, &name.to_lowercase()).await
    }

    async fn lookup_id(&self, id: &str) -> Result<Value, UpstreamError> {
        self.answer(&self.by_id, id).await
    }
}

/// Mock profile source
///
/// Bodies are registered as full envelopes (`{profiles: [...]}` or
/// `{profile: {...}}`) so tests can feed malformed payloads through.
/// Unregistered ids answer with a 404 status error.
#[derive(Debug, Clone, Default)]
pub struct MockProfileSource {
    lists: Responses,
    documents: Responses,
    calls: CallCounter,
    delay: Option<Duration>,
}

impl MockProfileSource {
    /// Create a source with no profiles
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer a profile-list request for an identity id
    pub fn add_profiles(&self, identity_id: &str, envelope: Value) {
        insert(&self.lists, identity_id.to_string(), Ok(envelope));
    }

    /// Fail a profile-list request for an identity id
    pub fn add_profiles_error(&self, identity_id: &str, error: UpstreamError) {
        insert(&self.lists, identity_id.to_string(), Err(error));
    }

    /// Answer a profile request
    pub fn add_profile(&self, profile_id: &str, envelope: Value) {
        insert(&self.documents, profile_id.to_string(), Ok(envelope));
    }

    /// Fail a profile request
    pub fn add_profile_error(&self, profile_id: &str, error: UpstreamError) {
        insert(&self.documents, profile_id.to_string(), Err(error));
    }

    /// Get the number of requests made, lists and documents together
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.calls.reset();
    }

    async fn answer(&self, responses: &Responses, key: &str) -> Result<Value, UpstreamError> {
        self.calls.increment();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        lookup(responses, key)
    }
}

#[async_trait]
impl ProfileSource for MockProfileSource {
    async fn profiles(&self, identity_id: &str) -> Result<Value, UpstreamError> {
        self.answer(&self.lists, identity_id).await
    }

    async fn profile(&self, profile_id: &str) -> Result<Value, UpstreamError> {
        self.answer(&self.documents, profile_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTCH: &str = "069a79f444e94726a5befca90e38aaf5";

    #[tokio::test]
    async fn test_mock_identity_lookups() {
        let source = MockIdentitySource::new().with_identity(NOTCH, "Notch");

        let by_name = source.lookup_name("NOTCH").await.unwrap();
        assert_eq!(by_name, json!({"id": NOTCH, "name": "Notch"}));

        let by_id = source.lookup_id(NOTCH).await.unwrap();
        assert_eq!(by_id["name"], "Notch");

        assert_eq!(source.lookup_name("jeb_").await.unwrap_err().status(), Some(404));
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_identity_custom_answers() {
        let source = MockIdentitySource::new();
        source.add_name_response("weird", json!({"id": "short", "name": ""}));
        source.add_name_error("flaky", UpstreamError::Communication("reset".into()));

        assert_eq!(source.lookup_name("Weird").await.unwrap()["id"], "short");
        assert!(matches!(
            source.lookup_name("flaky").await,
            Err(UpstreamError::Communication(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_clone_shares_state() {
        let source = MockIdentitySource::new();
        let clone = source.clone();
        clone.add_identity(NOTCH, "Notch");

        assert!(source.lookup_name("notch").await.is_ok());
        assert_eq!(clone.call_count(), 1);

        clone.reset_call_count();
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_profile_source() {
        let source = MockProfileSource::new();
        source.add_profiles(NOTCH, json!({"success": true, "profiles": []}));
        source.add_profile_error(
            "p1",
            UpstreamError::Status {
                status: 422,
                cause: "Malformed UUID".into(),
            },
        );

        assert_eq!(source.profiles(NOTCH).await.unwrap()["profiles"], json!([]));
        assert_eq!(source.profile("p1").await.unwrap_err().status(), Some(422));
        assert_eq!(source.profile("p2").await.unwrap_err().status(), Some(404));
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_delay() {
        let source = MockProfileSource::new().with_delay(Duration::from_secs(5));
        let start = tokio::time::Instant::now();
        let _ = source.profile("p").await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }
}
