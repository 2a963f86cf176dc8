//! Identity module - the canonical player record

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity id: 32 lowercase hex characters
///
/// Upstream hands ids out undashed, but callers frequently paste the dashed
/// UUID form. Both are accepted and normalized to the undashed form so that
/// store lookups and cache keys agree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityId(String);

impl IdentityId {
    /// Parse an identity id from its undashed or dashed form
    ///
    /// # Examples
    ///
    /// ```
    /// use lodestone_domain::IdentityId;
    ///
    /// let id = IdentityId::parse("B876EC32-E396-476B-A115-8438D83C67D4").unwrap();
    /// assert_eq!(id.as_str(), "b876ec32e396476ba1158438d83c67d4");
    /// ```
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.len() {
            32 if value.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(Self(value.to_ascii_lowercase()))
            }
            36 => uuid::Uuid::try_parse(value)
                .map(|u| Self(u.simple().to_string()))
                .map_err(|e| format!("Invalid identity id '{}': {}", value, e)),
            _ => Err(format!(
                "Invalid identity id '{}': expected 32 hex characters",
                value
            )),
        }
    }

    /// Get the undashed id
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the id in dashed UUID form
    pub fn hyphenated(&self) -> String {
        // Parsing guarantees 32 hex chars, so the slices are in bounds.
        format!(
            "{}-{}-{}-{}-{}",
            &self.0[0..8],
            &self.0[8..12],
            &self.0[12..16],
            &self.0[16..20],
            &self.0[20..32]
        )
    }
}

impl TryFrom<String> for IdentityId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IdentityId> for String {
    fn from(id: IdentityId) -> Self {
        id.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for IdentityId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Human-readable player name
///
/// 1–16 characters, ASCII letters, digits and underscores. Names compare
/// case-sensitively as values, but lookups go through [`PlayerName::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    /// Maximum name length accepted upstream
    pub const MAX_LEN: usize = 16;

    /// Create a new player name
    ///
    /// # Errors
    /// Returns error if the name is empty, too long, or has foreign characters
    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();

        if value.is_empty() {
            return Err("Player name must be at least 1 character long".to_string());
        }
        if value.len() > Self::MAX_LEN {
            return Err(format!(
                "Player name must be at most {} characters long",
                Self::MAX_LEN
            ));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(
                "Player name must only contain alphanumeric characters and underscores"
                    .to_string(),
            );
        }

        Ok(Self(value))
    }

    /// Get the name as given
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased name, used for cache keys and store lookups
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl TryFrom<String> for PlayerName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PlayerName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A resolved identity
///
/// Immutable once resolved; the id is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque id
    pub id: IdentityId,

    /// Name as reported by the identity source
    pub name: PlayerName,
}

impl Identity {
    /// Create a new identity
    pub fn new(id: IdentityId, name: PlayerName) -> Self {
        Self { id, name }
    }
}
