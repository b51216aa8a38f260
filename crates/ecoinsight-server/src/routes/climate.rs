use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use ecoinsight_cache::{cache_key, CLIMATE_PREFIX};
use ecoinsight_core::climate::DataType;
use ecoinsight_core::pagination::Page;
use ecoinsight_pg::climate::{ClimateFilter, ClimatePatch, CreateClimateParams};

use crate::auth::extract::AuthUser;
use crate::error::AppError;
use crate::routes::body::{
    as_object, optional_str, parse_metadata, parse_timestamp, reject_unknown_fields, require_str,
};
use crate::routes::{ok_data, ok_page, parse_id, query_param};
use crate::state::AppState;

/// List results are re-derivable and read-heavy; half an hour of staleness
/// is acceptable because every mutation purges the prefix anyway.
const LIST_TTL_SECS: u64 = 1800;

const UPDATE_FIELDS: [&str; 7] = [
    "location",
    "dataType",
    "timestamp",
    "value",
    "unit",
    "source",
    "metadata",
];

fn filter_from_query(params: &HashMap<String, String>) -> Result<ClimateFilter, AppError> {
    let data_type = query_param(params, "dataType")
        .map(|raw| {
            raw.parse::<DataType>()
                .map_err(|e| AppError::Validation(e.to_string()))
        })
        .transpose()?;
    let start = query_param(params, "startDate")
        .map(|raw| parse_timestamp(raw, "startDate"))
        .transpose()?;
    let end = query_param(params, "endDate")
        .map(|raw| parse_timestamp(raw, "endDate"))
        .transpose()?;
    Ok(ClimateFilter {
        location: query_param(params, "location").map(str::to_string),
        data_type,
        start,
        end,
    })
}

/// GET /api/v1/climate
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = filter_from_query(&params)?;
    let page = Page::resolve(
        query_param(&params, "page"),
        query_param(&params, "limit"),
    );

    let mut fields = vec![
        ("page", page.page.to_string()),
        ("limit", page.limit.to_string()),
    ];
    if let Some(location) = &filter.location {
        fields.push(("location", location.clone()));
    }
    if let Some(data_type) = filter.data_type {
        fields.push(("dataType", data_type.to_string()));
    }
    if let Some(start) = filter.start {
        fields.push(("startDate", start.to_rfc3339()));
    }
    if let Some(end) = filter.end {
        fields.push(("endDate", end.to_rfc3339()));
    }
    let key = cache_key(CLIMATE_PREFIX, &fields);

    if let Some(cached) = state.cache.get::<Value>(&key).await {
        return Ok(Json(cached));
    }

    let (items, total) = state.docs.list_climate(&filter, page.limit, page.offset()).await?;
    let response = ok_page(&items, &page.envelope(total));
    state.cache.set(&key, &response, LIST_TTL_SECS).await;
    Ok(Json(response))
}

/// GET /api/v1/climate/{id}
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let observation = state
        .docs
        .get_climate(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Climate data not found".to_string()))?;
    Ok(Json(ok_data(&observation)))
}

/// POST /api/v1/climate (auth required)
pub async fn create(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let obj = as_object(&payload)?;
    reject_unknown_fields(obj, &UPDATE_FIELDS)?;

    let location = require_str(obj, "location")?.to_string();
    let data_type = require_str(obj, "dataType")?
        .parse::<DataType>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let timestamp = parse_timestamp(require_str(obj, "timestamp")?, "timestamp")?;
    let value = obj
        .get("value")
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| AppError::Validation("value is required".to_string()))?;
    let unit = require_str(obj, "unit")?.to_string();
    let source = require_str(obj, "source")?.to_string();
    let metadata = parse_metadata(obj)?;

    let created = state
        .docs
        .create_climate(CreateClimateParams {
            location,
            data_type,
            timestamp,
            value,
            unit,
            source,
            metadata,
        })
        .await?;

    state.cache.delete_by_pattern("climate:*").await;
    info!(id = %created.id, "climate observation created");
    Ok((StatusCode::CREATED, Json(ok_data(&created))))
}

fn patch_from_body(obj: &serde_json::Map<String, Value>) -> Result<ClimatePatch, AppError> {
    let data_type = optional_str(obj, "dataType")?
        .map(|raw| {
            raw.parse::<DataType>()
                .map_err(|e| AppError::Validation(e.to_string()))
        })
        .transpose()?;
    let timestamp = optional_str(obj, "timestamp")?
        .map(|raw| parse_timestamp(raw, "timestamp"))
        .transpose()?;
    let metadata = if obj.get("metadata").is_some_and(|v| !v.is_null()) {
        Some(parse_metadata(obj)?)
    } else {
        None
    };
    Ok(ClimatePatch {
        location: optional_str(obj, "location")?.map(str::to_string),
        data_type,
        timestamp,
        value: obj.get("value").filter(|v| !v.is_null()).cloned(),
        unit: optional_str(obj, "unit")?.map(str::to_string),
        source: optional_str(obj, "source")?.map(str::to_string),
        metadata,
    })
}

/// PUT /api/v1/climate/{id} (auth required, allow-listed fields)
pub async fn update(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let obj = as_object(&payload)?;
    reject_unknown_fields(obj, &UPDATE_FIELDS)?;
    let patch = patch_from_body(obj)?;

    let updated = state
        .docs
        .update_climate(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Climate data not found".to_string()))?;

    state.cache.delete_by_pattern("climate:*").await;
    Ok(Json(ok_data(&updated)))
}

/// DELETE /api/v1/climate/{id} (auth required)
pub async fn delete(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    if !state.docs.delete_climate(id).await? {
        return Err(AppError::NotFound("Climate data not found".to_string()));
    }

    state.cache.delete_by_pattern("climate:*").await;
    info!(%id, "climate observation deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Climate data deleted"
    })))
}
