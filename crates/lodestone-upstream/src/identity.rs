//! Identity lookup client
//!
//! Talks to the account service that maps player names to ids:
//!
//! - `GET {base}/lookup/name/{name}` → `{id, name}`
//! - `GET {base}/lookup/uuid/{id}` → `{id, name}`
//!
//! The service needs no credentials.
//!
//! # Examples
//!
//! ```no_run
//! use lodestone_upstream::{IdentityClient, IdentitySource};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = IdentityClient::default_endpoint()?;
//! let body = client.lookup_name("Notch").await?;
//! println!("{}", body["id"]);
//! # Ok(())
//! # }
//! ```

use crate::http::{build_client, read_json, send_error};
use crate::{IdentitySource, UpstreamError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default identity service endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.minecraftservices.com/minecraft/profile";

/// Default timeout for identity requests (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP client for the identity service
#[derive(Debug, Clone)]
pub struct IdentityClient {
    endpoint: String,
    client: reqwest::Client,
}

impl IdentityClient {
    /// Create a client for the given endpoint and request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }

    /// Create a client for the public endpoint with the default timeout
    pub fn default_endpoint() -> Result<Self, UpstreamError> {
        Self::new(DEFAULT_ENDPOINT, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Base URL requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get(&self, url: String) -> Result<Value, UpstreamError> {
        tracing::debug!(url = %url, "Calling identity upstream");
        let response = self.client.get(&url).send().await.map_err(send_error)?;
        read_json(response).await
    }
}

#[async_trait]
impl IdentitySource for IdentityClient {
    async fn lookup_name(&self, name: &str) -> Result<Value, UpstreamError> {
        self.get(format!("{}/lookup/name/{}", self.endpoint, name))
            .await
    }

    async fn lookup_id(&self, id: &str) -> Result<Value, UpstreamError> {
        self.get(format!("{}/lookup/uuid/{}", self.endpoint, id)).await
    }
}
