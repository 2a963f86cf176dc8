//! Lodestone Gatekeeper
//!
//! Validates raw upstream payloads before anything downstream trusts them.
//!
//! The Gatekeeper provides:
//! - Shape checks on identity, profile-list and profile-document bodies
//! - Conversion of accepted bodies into typed domain values
//! - Every violation found, not just the first, with the offending path
//!
//! # Examples
//!
//! ```
//! use lodestone_gatekeeper::validate_identity;
//! use serde_json::json;
//!
//! let identity = validate_identity(&json!({
//!     "id": "069a79f444e94726a5befca90e38aaf5",
//!     "name": "Notch"
//! }))
//! .unwrap();
//! assert_eq!(identity.name.as_str(), "Notch");
//!
//! let err = validate_identity(&json!({"id": "nope", "name": ""})).unwrap_err();
//! assert_eq!(err.len(), 2);
//! ```

#![warn(missing_docs)]

mod error;
mod validator;

pub use error::Violations;
pub use validator::{validate_identity, validate_profile_detail, validate_profile_list};
