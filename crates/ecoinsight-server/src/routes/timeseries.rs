use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tracing::info;

use ecoinsight_core::climate::DataType;
use ecoinsight_core::timeseries::{
    validate_bucket_interval, TimeseriesPoint, DEFAULT_BUCKET_INTERVAL,
};

use crate::auth::extract::AuthUser;
use crate::error::AppError;
use crate::routes::body::{
    as_object, parse_metadata, parse_timestamp, reject_unknown_fields, require_number, require_str,
};
use crate::routes::query_param;
use crate::state::AppState;

const POINT_FIELDS: [&str; 7] = [
    "location",
    "dataType",
    "timestamp",
    "value",
    "unit",
    "source",
    "metadata",
];

/// POST /api/v1/timeseries (auth required)
///
/// `value` must be a JSON number. A numeric string never coerces; the
/// aggregate queries depend on every stored value being a real double.
pub async fn insert(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let obj = as_object(&payload)?;
    reject_unknown_fields(obj, &POINT_FIELDS)?;

    let point = TimeseriesPoint {
        location: require_str(obj, "location")?.to_string(),
        data_type: require_str(obj, "dataType")?
            .parse::<DataType>()
            .map_err(|e| AppError::Validation(e.to_string()))?,
        timestamp: parse_timestamp(require_str(obj, "timestamp")?, "timestamp")?,
        value: require_number(obj, "value")?,
        unit: require_str(obj, "unit")?.to_string(),
        source: require_str(obj, "source")?.to_string(),
        metadata: parse_metadata(obj)?,
    };

    let id = state.series.insert_point(&point).await?;
    info!(id, location = %point.location, "timeseries point inserted");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "id": id } })),
    ))
}

/// GET /api/v1/timeseries
///
/// Bucketed avg/min/max aggregate. Not cached: ranges default to a moving
/// [now-24h, now] window, so keys would almost never repeat.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let location = query_param(&params, "location")
        .ok_or_else(|| AppError::Validation("location is required".to_string()))?;
    let data_type = query_param(&params, "dataType")
        .ok_or_else(|| AppError::Validation("dataType is required".to_string()))?
        .parse::<DataType>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let now = Utc::now();
    let start = query_param(&params, "start")
        .map(|raw| parse_timestamp(raw, "start"))
        .transpose()?
        .unwrap_or(now - Duration::hours(24));
    let end = query_param(&params, "end")
        .map(|raw| parse_timestamp(raw, "end"))
        .transpose()?
        .unwrap_or(now);

    let bucket = query_param(&params, "bucket").unwrap_or(DEFAULT_BUCKET_INTERVAL);
    validate_bucket_interval(bucket).map_err(|e| AppError::Validation(e.to_string()))?;

    let buckets = state
        .series
        .bucket_query(location, data_type, start, end, bucket)
        .await?;
    Ok(Json(json!({ "success": true, "data": buckets })))
}
