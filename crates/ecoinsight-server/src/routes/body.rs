//! Request-body validation helpers.
//!
//! Bodies are taken as raw `serde_json::Value` rather than typed `Json<T>`
//! extractors so malformed input produces the API's own 400 envelope and
//! update allow-lists can reject unknown keys explicitly instead of
//! silently dropping them.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use ecoinsight_core::climate::Metadata;

use crate::error::AppError;

pub fn as_object(body: &Value) -> Result<&Map<String, Value>, AppError> {
    body.as_object()
        .ok_or_else(|| AppError::Validation("request body must be a JSON object".to_string()))
}

/// A required, non-empty string field.
pub fn require_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a str, AppError> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(AppError::Validation(format!(
            "{field} is required"
        ))),
        Some(_) => Err(AppError::Validation(format!("{field} must be a string"))),
    }
}

pub fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a str>, AppError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(AppError::Validation(format!("{field} must be a string"))),
    }
}

/// A required numeric field. Strings are never coerced: `"abc"` (and even
/// `"42"`) fail validation rather than becoming 0 or NaN.
pub fn require_number(obj: &Map<String, Value>, field: &str) -> Result<f64, AppError> {
    match obj.get(field) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| AppError::Validation(format!("{field} is not a finite number"))),
        None | Some(Value::Null) => Err(AppError::Validation(format!("{field} is required"))),
        Some(_) => Err(AppError::Validation(format!("{field} must be a number"))),
    }
}

pub fn optional_number(obj: &Map<String, Value>, field: &str) -> Result<Option<f64>, AppError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("{field} is not a finite number"))),
        Some(_) => Err(AppError::Validation(format!("{field} must be a number"))),
    }
}

pub fn optional_bool(obj: &Map<String, Value>, field: &str) -> Result<Option<bool>, AppError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(AppError::Validation(format!("{field} must be a boolean"))),
    }
}

/// Parse an RFC 3339 timestamp.
pub fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("{field} must be an RFC 3339 timestamp")))
}

/// Optional `metadata` object, defaulting to empty.
pub fn parse_metadata(obj: &Map<String, Value>) -> Result<Metadata, AppError> {
    match obj.get("metadata") {
        None | Some(Value::Null) => Ok(Metadata::default()),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
            .map_err(|_| AppError::Validation("metadata must be an object".to_string())),
        Some(_) => Err(AppError::Validation("metadata must be an object".to_string())),
    }
}

/// Reject any body key outside the entity's allow-list. Prevents partial,
/// surprising writes: an unrecognized key is a 400, not a dropped field.
pub fn reject_unknown_fields(
    obj: &Map<String, Value>,
    allowed: &[&str],
) -> Result<(), AppError> {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(AppError::Validation(format!("unknown field: {key}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_are_not_coerced_from_strings() {
        let obj = json!({ "value": "abc" });
        assert!(require_number(obj.as_object().unwrap(), "value").is_err());
        let obj = json!({ "value": "42" });
        assert!(require_number(obj.as_object().unwrap(), "value").is_err());
        let obj = json!({ "value": 42 });
        assert_eq!(require_number(obj.as_object().unwrap(), "value").unwrap(), 42.0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let obj = json!({ "location": "x", "bogus": 1 });
        let err = reject_unknown_fields(obj.as_object().unwrap(), &["location"]).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn empty_string_fails_required_check() {
        let obj = json!({ "location": "" });
        assert!(require_str(obj.as_object().unwrap(), "location").is_err());
    }

    #[test]
    fn timestamp_must_be_rfc3339() {
        assert!(parse_timestamp("2024-06-01T12:00:00Z", "timestamp").is_ok());
        assert!(parse_timestamp("June 1st", "timestamp").is_err());
    }
}
