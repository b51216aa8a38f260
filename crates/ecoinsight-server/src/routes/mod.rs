pub mod body;
pub mod climate;
pub mod esg;
pub mod health;
pub mod live;
pub mod timeseries;

use std::collections::HashMap;

use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use ecoinsight_core::pagination::PageInfo;

use crate::error::AppError;

/// Path ids are validated before any store call so a malformed id is a
/// 400, not a driver error surfacing as 500.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("invalid id: {raw}")))
}

/// Success envelope for single-document responses.
pub fn ok_data<T: Serialize>(data: &T) -> Value {
    json!({ "success": true, "data": data })
}

/// Success envelope for paginated lists.
pub fn ok_page<T: Serialize>(items: &[T], pagination: &PageInfo) -> Value {
    json!({ "success": true, "data": items, "pagination": pagination })
}

/// Rate-limit key: first address in X-Forwarded-For when present (we sit
/// behind a proxy in deployment), else the literal fallback.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Fetch a query parameter as a trimmed non-empty string.
pub fn query_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(|v| v.as_str()).filter(|v| !v.is_empty())
}
