//! Profile data client
//!
//! Talks to the game-data service holding profile lists and documents:
//!
//! - `GET {base}/profiles?uuid={identity id}` → `{profiles: [...]}`
//! - `GET {base}/profile?profile={profile id}` → `{profile: {...}}`
//!
//! Every request carries the `API-Key` header. Failures come back as
//! `{success: false, cause}`; the cause ends up in [`UpstreamError::Status`].

use crate::http::{build_client, read_json, send_error};
use crate::{ProfileSource, UpstreamError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default profile service endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.hypixel.net/v2/skyblock";

/// Default timeout for profile requests (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "API-Key";

/// HTTP client for the profile service
#[derive(Clone)]
pub struct ProfileClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for ProfileClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProfileClient {
    /// Create a client for the given endpoint, key and request timeout
    ///
    /// Without a key the upstream rejects every request with 403; the client
    /// still gets built so that failures surface per request.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        if api_key.is_none() {
            tracing::warn!("No API key configured for the profile upstream");
        }

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            client: build_client(timeout)?,
        })
    }

    /// Base URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn get(&self, path: &str, query: (&str, &str)) -> Result<Value, UpstreamError> {
        let url = format!("{}/{}", self.endpoint, path);
        tracing::debug!(url = %url, "{} = {}", query.0, query.1);

        let mut request = self.client.get(&url).query(&[query]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(send_error)?;
        read_json(response).await
    }
}

#[async_trait]
impl ProfileSource for ProfileClient {
    async fn profiles(&self, identity_id: &str) -> Result<Value, UpstreamError> {
        self.get("profiles", ("uuid", identity_id)).await
    }

    async fn profile(&self, profile_id: &str) -> Result<Value, UpstreamError> {
        self.get("profile", ("profile", profile_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_client_creation() {
        let client = ProfileClient::new(
            "http://localhost:8080/v2/",
            Some("secret".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v2");
        assert!(client.has_api_key());
    }

    #[test]
    fn test_debug_redacts_key() {
        let client =
            ProfileClient::new(DEFAULT_ENDPOINT, Some("secret".to_string()), Duration::from_secs(1))
                .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
