//! Lodestone Upstream Sources
//!
//! HTTP clients for the two slow upstreams Lodestone reads through to.
//!
//! # Architecture
//!
//! Each upstream sits behind an async trait and hands back raw JSON. Shape
//! checking happens later, in `lodestone-gatekeeper`, so the clients only
//! care about transport: status codes, timeouts and undecodable bodies.
//!
//! # Sources
//!
//! - `IdentityClient`: name/id lookups (`IdentitySource`)
//! - `ProfileClient`: profile lists and documents, keyed by `API-Key` (`ProfileSource`)
//! - `MockIdentitySource` / `MockProfileSource`: deterministic in-memory sources for testing
//!
//! # Examples
//!
//! ```
//! use lodestone_upstream::{IdentitySource, MockIdentitySource};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let source = MockIdentitySource::new()
//!     .with_identity("069a79f444e94726a5befca90e38aaf5", "Notch");
//!
//! let body = source.lookup_name("notch").await.unwrap();
//! assert_eq!(body["name"], "Notch");
//! assert_eq!(source.call_count(), 1);
//! # }
//! ```

#![warn(missing_docs)]

mod http;
pub mod identity;
pub mod mock;
pub mod profile;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use identity::IdentityClient;
pub use mock::{MockIdentitySource, MockProfileSource};
pub use profile::ProfileClient;

/// Errors that can occur while talking to an upstream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status
    #[error("HTTP {status}: {cause}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Cause reported by the upstream, or the status reason phrase
        cause: String,
    },

    /// Request never produced a response (connection failure, timeout)
    #[error("Communication error: {0}")]
    Communication(String),

    /// Success status, but the body is not JSON
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// HTTP status, if the upstream answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Source of identity records
///
/// Any non-success answer means the identity does not exist upstream.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// Look an identity up by name, returning the raw `{id, name}` body
    async fn lookup_name(&self, name: &str) -> Result<Value, UpstreamError>;

    /// Look an identity up by its undashed id, returning the raw `{id, name}` body
    async fn lookup_id(&self, id: &str) -> Result<Value, UpstreamError>;
}

/// Source of profile data
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the `{profiles: [...]}` envelope for an identity id
    async fn profiles(&self, identity_id: &str) -> Result<Value, UpstreamError>;

    /// Fetch the `{profile: {...}}` envelope for a profile id
    async fn profile(&self, profile_id: &str) -> Result<Value, UpstreamError>;
}
