//! Profile module - profile summaries and detail documents

use crate::IdentityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Game mode of a profile
///
/// Upstream omits the mode for ordinary profiles, which is why
/// [`GameMode::Normal`] is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Ordinary profile (absent upstream)
    #[default]
    Normal,

    /// Ironman: no trading
    Ironman,

    /// Bingo: seasonal challenge profile
    Bingo,

    /// Stranded: island-only profile
    Stranded,
}

impl GameMode {
    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Normal => "normal",
            GameMode::Ironman => "ironman",
            GameMode::Bingo => "bingo",
            GameMode::Stranded => "stranded",
        }
    }

    /// Parse a mode from its upstream spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(GameMode::Normal),
            "ironman" => Some(GameMode::Ironman),
            "bingo" => Some(GameMode::Bingo),
            "stranded" => Some(GameMode::Stranded),
            _ => None,
        }
    }
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid game mode: {}", s))
    }
}

/// Every label upstream assigns to profiles
pub const PROFILE_LABELS: [&str; 25] = [
    "Apple",
    "Banana",
    "Blueberry",
    "Coconut",
    "Cucumber",
    "Grapes",
    "Kiwi",
    "Lemon",
    "Lime",
    "Mango",
    "Orange",
    "Papaya",
    "Pear",
    "Peach",
    "Pineapple",
    "Pomegranate",
    "Raspberry",
    "Strawberry",
    "Tomato",
    "Watermelon",
    "Zucchini",
    "Not Allowed To Quit SkyBlock Ever Again",
    "Complain Everyday",
    "Restored",
    "TEST",
];

/// Display label of a profile, constrained to [`PROFILE_LABELS`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileLabel(String);

impl ProfileLabel {
    /// Create a label, rejecting anything outside the known set
    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if PROFILE_LABELS.contains(&value.as_str()) {
            Ok(Self(value))
        } else {
            Err(format!("Invalid profile label '{}'", value))
        }
    }

    /// Get the label as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProfileLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProfileLabel> for String {
    fn from(label: ProfileLabel) -> Self {
        label.0
    }
}

impl fmt::Display for ProfileLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of an identity's profile list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Upstream profile id
    pub profile_id: Uuid,

    /// Display label
    pub label: ProfileLabel,

    /// Game mode (defaults to normal)
    pub mode: GameMode,

    /// Whether this is the identity's currently selected profile
    pub is_active: bool,
}

/// A full profile document
///
/// Members map identity ids to their opaque per-member payloads. The payload
/// is only interpreted by [`crate::metrics`]. Not persisted, cached only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDetail {
    /// Upstream profile id
    pub profile_id: Uuid,

    /// Game mode (defaults to normal)
    pub mode: GameMode,

    /// Per-member raw payloads
    pub members: BTreeMap<IdentityId, serde_json::Value>,
}

impl ProfileDetail {
    /// Look up one member's payload
    pub fn member(&self, id: &IdentityId) -> Option<&serde_json::Value> {
        self.members.get(id)
    }

    /// Whether the identity belongs to this profile
    pub fn has_member(&self, id: &IdentityId) -> bool {
        self.members.contains_key(id)
    }
}
