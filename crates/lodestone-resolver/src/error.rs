//! Error types for resolution

use lodestone_domain::IdentityId;
use lodestone_gatekeeper::Violations;
use lodestone_upstream::UpstreamError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while resolving an entity
///
/// `Clone` so that failures can be memoized in a cache's failure namespace
/// and handed to every coalesced waiter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// The identity upstream does not know this name or id
    #[error("Identity '{name}' not found")]
    NotFound {
        /// Name or id that was looked up
        name: String,
    },

    /// Upstream call failed
    #[error("Upstream request failed{}: {cause}", status_suffix(.status))]
    Transport {
        /// HTTP status; `None` for timeouts and connection failures
        status: Option<u16>,
        /// Cause reported by the upstream
        cause: String,
    },

    /// Upstream payload does not have the expected shape
    #[error("Validation error: {violations}")]
    Validation {
        /// Every violation found
        violations: Violations,
    },

    /// Upstream answered successfully but holds no such profile
    #[error("Profile {profile_id} does not exist: {violations}")]
    NonexistentProfile {
        /// Requested profile
        profile_id: Uuid,
        /// Why the document was rejected
        violations: Violations,
    },

    /// The identity is not a member of the profile
    #[error("Identity {identity_id} is not a member of profile {profile_id}")]
    Membership {
        /// Identity looked up
        identity_id: IdentityId,
        /// Profile searched
        profile_id: Uuid,
    },

    /// Entry store error
    #[error("Store error: {0}")]
    Store(String),

    /// Member payload could not be turned into metrics
    #[error("Metrics error: {0}")]
    Metrics(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl ResolveError {
    /// Whether this error may be memoized in a failure cache
    ///
    /// Only definitive upstream answers qualify. Timeouts, connection
    /// failures, validation problems and local errors are retried on the
    /// next call.
    pub fn is_memoizable(&self) -> bool {
        matches!(
            self,
            ResolveError::NotFound { .. } | ResolveError::Transport { status: Some(_), .. }
        )
    }

    /// Map an upstream failure whose status carries meaning of its own
    pub(crate) fn from_upstream(error: UpstreamError) -> Self {
        match error {
            UpstreamError::Status { status, cause } => ResolveError::Transport {
                status: Some(status),
                cause,
            },
            UpstreamError::Communication(cause) => ResolveError::Transport { status: None, cause },
            UpstreamError::InvalidResponse(message) => {
                let mut violations = Violations::new();
                violations.push("$", message);
                ResolveError::Validation { violations }
            }
        }
    }
}
