//! Lookup helpers for response bodies whose shape varies by endpoint: first-present-wins
//! field candidates and scalar readers that accept strings or numbers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Bearer token field names in a login response, in priority order
pub const LOGIN_TOKEN_FIELDS: &[&str] = &["token", "access_token", "accessToken", "jwt"];
/// Email field names in a login response
pub const LOGIN_EMAIL_FIELDS: &[&str] = &["email", "user.email"];
/// User id field names in a login response
pub const LOGIN_USER_ID_FIELDS: &[&str] = &["user.id", "id"];
/// Plan tier field names in a login response
pub const LOGIN_PLAN_FIELDS: &[&str] = &["user.plan", "plan"];

/// Looks up a dotted path (`"user.email"`) in a JSON object.
#[must_use]
pub fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(value, |cur, key| cur.as_object()?.get(key))
}

/// Returns the first candidate that resolves to a non-empty string.
///
/// Numbers are accepted and rendered in decimal, since ids are sometimes numeric.
#[must_use]
pub fn first_string(value: &Value, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|path| match lookup(value, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Renders a scalar as text: strings verbatim, numbers and booleans in their
/// JSON form. Arrays, objects and null give `None`.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Reads a number, or a string holding one.
#[must_use]
pub fn scalar_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `deserialize_with` for identifiers sent either as strings or as numbers
pub(crate) fn id_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(scalar_text(&Value::deserialize(d)?).unwrap_or_default())
}

/// `deserialize_with` for optional text fields; unexpected shapes read as absent
pub(crate) fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(&Value::deserialize(d)?))
}

/// `deserialize_with` for optional numeric fields; numeric strings are accepted
pub(crate) fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(scalar_number(&Value::deserialize(d)?))
}
