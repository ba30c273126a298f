//! Worker payload to `FollowerRecord` mapping

use serde_json::{Map, Value};

use crate::error::ShapeError;
use crate::types::FollowerRecord;

/// Normalized contents of a `success: true` worker payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedPayload {
    /// Followers in worker emission order
    pub followers: Vec<FollowerRecord>,
    /// Worker's `info` string
    pub info: Option<String>,
    /// Worker's own `method` label
    pub label: Option<String>,
    /// Worker's `reason` for an empty result
    pub reason: Option<String>,
}

/// Map a success payload into follower records.
///
/// Each entry needs a string `username` and an `id` given as a string or an
/// integer. `full_name` defaults to an empty string. Optional fields are kept
/// only when present with the expected type.
pub fn normalize(payload: &Map<String, Value>) -> Result<NormalizedPayload, ShapeError> {
    let entries = payload
        .get("followers")
        .and_then(Value::as_array)
        .ok_or(ShapeError::MissingFollowers)?;

    let followers = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| normalize_entry(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NormalizedPayload {
        followers,
        info: string_field(payload, "info"),
        label: string_field(payload, "method"),
        reason: string_field(payload, "reason"),
    })
}

fn normalize_entry(index: usize, entry: &Value) -> Result<FollowerRecord, ShapeError> {
    let obj = entry.as_object().ok_or(ShapeError::NotAnObject { index })?;

    let username = obj
        .get("username")
        .and_then(Value::as_str)
        .ok_or(ShapeError::MissingField {
            index,
            field: "username",
        })?
        .to_string();

    let id = match obj.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => n.to_string(),
        _ => {
            return Err(ShapeError::MissingField { index, field: "id" });
        }
    };

    Ok(FollowerRecord {
        username,
        full_name: string_field(obj, "full_name")
            .or_else(|| string_field(obj, "fullName"))
            .unwrap_or_default(),
        id,
        follower_count: first_of(obj, &["follower_count", "followerCount"])
            .and_then(Value::as_u64),
        biography: first_of(obj, &["biography"]).and_then(|v| v.as_str().map(str::to_string)),
        email: string_field(obj, "email"),
        is_verified: first_of(obj, &["is_verified", "isVerified"]).and_then(Value::as_bool),
        is_private: first_of(obj, &["is_private", "isPrivate"]).and_then(Value::as_bool),
    })
}

fn first_of<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
