//! Payload validation logic
//!
//! Each validator walks the whole payload, collecting every violation
//! before deciding, so callers see all problems at once.

use crate::Violations;
use lodestone_domain::{
    GameMode, Identity, IdentityId, PlayerName, ProfileDetail, ProfileLabel, ProfileSummary,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Validate an identity body `{id, name}`
///
/// The id must be exactly 32 hex characters (the undashed form upstream
/// uses); the name must be a valid player name.
pub fn validate_identity(body: &Value) -> Result<Identity, Violations> {
    let mut violations = Violations::new();

    let Some(object) = body.as_object() else {
        violations.push("$", "Expected an object");
        return Err(violations);
    };

    let id = string_field(object, "id", "id", &mut violations).and_then(|raw| {
        if raw.len() == 32 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            IdentityId::parse(raw).map_err(|e| violations.push("id", e)).ok()
        } else {
            violations.push("id", "UUID must be a 32 character hex string");
            None
        }
    });

    let name = string_field(object, "name", "name", &mut violations)
        .and_then(|raw| PlayerName::new(raw).map_err(|e| violations.push("name", e)).ok());

    match (id, name) {
        (Some(id), Some(name)) if violations.is_empty() => Ok(Identity::new(id, name)),
        _ => Err(violations),
    }
}

/// Validate a profile-list envelope `{profiles: [...]}`
///
/// Each item needs `profile_id` (UUID), `cute_name` (a known label) and
/// `selected` (bool); `game_mode` is optional and defaults to normal. A
/// `null` list means the identity has no profiles.
pub fn validate_profile_list(envelope: &Value) -> Result<Vec<ProfileSummary>, Violations> {
    let mut violations = Violations::new();

    let items = match envelope.get("profiles") {
        Some(Value::Array(items)) => items,
        Some(Value::Null) => return Ok(Vec::new()),
        Some(_) => {
            violations.push("profiles", "Expected an array");
            return Err(violations);
        }
        None => {
            violations.push("profiles", "Required");
            return Err(violations);
        }
    };

    let mut summaries = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let path = format!("profiles[{}]", index);
        if let Some(summary) = validate_summary(item, &path, &mut violations) {
            summaries.push(summary);
        }
    }

    if violations.is_empty() {
        Ok(summaries)
    } else {
        Err(violations)
    }
}

fn validate_summary(item: &Value, path: &str, violations: &mut Violations) -> Option<ProfileSummary> {
    let Some(object) = item.as_object() else {
        violations.push(path, "Expected an object");
        return None;
    };

    let profile_id = profile_id_field(object, path, violations);

    let label_path = format!("{}.cute_name", path);
    let label = string_field(object, "cute_name", &label_path, violations)
        .and_then(|raw| ProfileLabel::new(raw).map_err(|e| violations.push(&label_path, e)).ok());

    let mode = game_mode_field(object, path, violations);

    let selected_path = format!("{}.selected", path);
    let is_active = match object.get("selected") {
        Some(Value::Bool(selected)) => Some(*selected),
        Some(_) => {
            violations.push(&selected_path, "Expected a boolean");
            None
        }
        None => {
            violations.push(&selected_path, "Required");
            None
        }
    };

    Some(ProfileSummary {
        profile_id: profile_id?,
        label: label?,
        mode: mode?,
        is_active: is_active?,
    })
}

/// Validate a profile envelope `{profile: {...}}`
///
/// The document needs `profile_id` (UUID) and `members`, an object keyed by
/// 32 lowercase hex identity ids; `game_mode` is optional. A missing or
/// `null` document fails like any other shape violation; callers decide
/// what that means.
pub fn validate_profile_detail(envelope: &Value) -> Result<ProfileDetail, Violations> {
    let mut violations = Violations::new();

    let object = match envelope.get("profile") {
        Some(Value::Object(object)) => object,
        Some(Value::Null) | None => {
            violations.push("profile", "Required");
            return Err(violations);
        }
        Some(_) => {
            violations.push("profile", "Expected an object");
            return Err(violations);
        }
    };

    let profile_id = profile_id_field(object, "profile", &mut violations);
    let mode = game_mode_field(object, "profile", &mut violations);

    let members = match object.get("members") {
        Some(Value::Object(members)) => {
            let mut parsed = BTreeMap::new();
            for (key, payload) in members {
                if is_lower_hex_id(key) {
                    if let Ok(id) = IdentityId::parse(key) {
                        parsed.insert(id, payload.clone());
                    }
                } else {
                    violations.push(
                        &format!("profile.members.{}", key),
                        "Member key must be a 32 character lowercase hex string",
                    );
                }
            }
            Some(parsed)
        }
        Some(_) => {
            violations.push("profile.members", "Expected an object");
            None
        }
        None => {
            violations.push("profile.members", "Required");
            None
        }
    };

    match (profile_id, mode, members) {
        (Some(profile_id), Some(mode), Some(members)) if violations.is_empty() => Ok(ProfileDetail {
            profile_id,
            mode,
            members,
        }),
        _ => Err(violations),
    }
}

fn is_lower_hex_id(key: &str) -> bool {
    key.len() == 32 && key.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    path: &str,
    violations: &mut Violations,
) -> Option<&'a str> {
    match object.get(field) {
        Some(Value::String(value)) => Some(value),
        Some(_) => {
            violations.push(path, "Expected a string");
            None
        }
        None => {
            violations.push(path, "Required");
            None
        }
    }
}

fn profile_id_field(object: &Map<String, Value>, parent: &str, violations: &mut Violations) -> Option<Uuid> {
    let path = format!("{}.profile_id", parent);
    string_field(object, "profile_id", &path, violations).and_then(|raw| {
        Uuid::try_parse(raw)
            .map_err(|_| violations.push(&path, "Invalid uuid"))
            .ok()
    })
}

fn game_mode_field(object: &Map<String, Value>, parent: &str, violations: &mut Violations) -> Option<GameMode> {
    let path = format!("{}.game_mode", parent);
    match object.get("game_mode") {
        None | Some(Value::Null) => Some(GameMode::Normal),
        Some(Value::String(raw)) => GameMode::parse(raw).or_else(|| {
            violations.push(
                &path,
                format!("Invalid enum value. Expected 'ironman' | 'bingo' | 'stranded', received '{}'", raw),
            );
            None
        }),
        Some(_) => {
            violations.push(&path, "Expected a string");
            None
        }
    }
}
