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

use ecoinsight_cache::{cache_key, ESG_PREFIX, METRICS_PREFIX};
use ecoinsight_core::esg::{validate_score, EsgMetrics, ReportType};
use ecoinsight_core::pagination::Page;
use ecoinsight_pg::esg::{CreateEsgParams, EsgFilter, EsgPatch};

use crate::auth::extract::AuthUser;
use crate::error::AppError;
use crate::routes::body::{
    as_object, optional_bool, optional_number, optional_str, reject_unknown_fields, require_str,
};
use crate::routes::{ok_data, ok_page, parse_id, query_param};
use crate::state::AppState;

/// ESG reports change rarely (annual/quarterly cadence), so lists tolerate
/// a longer TTL than climate data.
const LIST_TTL_SECS: u64 = 3600;
const METRICS_TTL_SECS: u64 = 1800;

const UPDATE_FIELDS: [&str; 7] = [
    "company",
    "year",
    "reportType",
    "metrics",
    "score",
    "source",
    "verified",
];

/// Both the report list and the metrics aggregate are derived from the
/// same rows, so every mutation purges both prefixes.
async fn purge(state: &AppState) {
    state.cache.delete_by_pattern("esg:*").await;
    state.cache.delete_by_pattern("metrics:*").await;
}

fn filter_from_query(params: &HashMap<String, String>) -> Result<EsgFilter, AppError> {
    let year = query_param(params, "year")
        .map(|raw| {
            raw.parse::<i32>()
                .map_err(|_| AppError::Validation("year must be an integer".to_string()))
        })
        .transpose()?;
    let report_type = query_param(params, "reportType")
        .map(|raw| {
            raw.parse::<ReportType>()
                .map_err(|e| AppError::Validation(e.to_string()))
        })
        .transpose()?;
    Ok(EsgFilter {
        company: query_param(params, "company").map(str::to_string),
        year,
        report_type,
    })
}

/// Year must be a JSON integer that fits in i32; floats and huge values
/// are rejected rather than truncated or saturated.
fn parse_year(obj: &serde_json::Map<String, Value>) -> Result<Option<i32>, AppError> {
    match obj.get("year") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .map(Some)
            .ok_or_else(|| AppError::Validation("year must be an integer".to_string())),
        Some(_) => Err(AppError::Validation("year must be an integer".to_string())),
    }
}

fn parse_score(obj: &serde_json::Map<String, Value>) -> Result<Option<f64>, AppError> {
    let score = optional_number(obj, "score")?;
    if let Some(score) = score {
        validate_score(score).map_err(AppError::Validation)?;
    }
    Ok(score)
}

fn parse_metrics(obj: &serde_json::Map<String, Value>) -> Result<Option<EsgMetrics>, AppError> {
    match obj.get("metrics") {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| AppError::Validation(format!("metrics: {e}"))),
        Some(_) => Err(AppError::Validation("metrics must be an object".to_string())),
    }
}

/// GET /api/v1/sustainability/esg
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
    if let Some(company) = &filter.company {
        fields.push(("company", company.clone()));
    }
    if let Some(year) = filter.year {
        fields.push(("year", year.to_string()));
    }
    if let Some(report_type) = filter.report_type {
        fields.push(("reportType", report_type.to_string()));
    }
    let key = cache_key(ESG_PREFIX, &fields);

    if let Some(cached) = state.cache.get::<Value>(&key).await {
        return Ok(Json(cached));
    }

    let (items, total) = state.docs.list_esg(&filter, page.limit, page.offset()).await?;
    let response = ok_page(&items, &page.envelope(total));
    state.cache.set(&key, &response, LIST_TTL_SECS).await;
    Ok(Json(response))
}

/// GET /api/v1/sustainability/esg/{id}
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let report = state
        .docs
        .get_esg(id)
        .await?
        .ok_or_else(|| AppError::NotFound("ESG report not found".to_string()))?;
    Ok(Json(ok_data(&report)))
}

/// POST /api/v1/sustainability/esg (auth required)
pub async fn create(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let obj = as_object(&payload)?;
    reject_unknown_fields(obj, &UPDATE_FIELDS)?;

    let company = require_str(obj, "company")?.to_string();
    let year =
        parse_year(obj)?.ok_or_else(|| AppError::Validation("year is required".to_string()))?;
    let report_type = require_str(obj, "reportType")?
        .parse::<ReportType>()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let metrics = parse_metrics(obj)?.unwrap_or_default();
    let score = parse_score(obj)?;
    let source = require_str(obj, "source")?.to_string();
    let verified = optional_bool(obj, "verified")?.unwrap_or(false);

    let created = state
        .docs
        .create_esg(CreateEsgParams {
            company,
            year,
            report_type,
            metrics,
            score,
            source,
            verified,
        })
        .await?;

    purge(&state).await;
    info!(id = %created.id, company = %created.company, "esg report created");
    Ok((StatusCode::CREATED, Json(ok_data(&created))))
}

/// PUT /api/v1/sustainability/esg/{id} (auth required, allow-listed fields)
pub async fn update(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let obj = as_object(&payload)?;
    reject_unknown_fields(obj, &UPDATE_FIELDS)?;

    let year = parse_year(obj)?;
    let report_type = optional_str(obj, "reportType")?
        .map(|raw| {
            raw.parse::<ReportType>()
                .map_err(|e| AppError::Validation(e.to_string()))
        })
        .transpose()?;
    let patch = EsgPatch {
        company: optional_str(obj, "company")?.map(str::to_string),
        year,
        report_type,
        metrics: parse_metrics(obj)?,
        score: parse_score(obj)?,
        source: optional_str(obj, "source")?.map(str::to_string),
        verified: optional_bool(obj, "verified")?,
    };

    let updated = state
        .docs
        .update_esg(id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("ESG report not found".to_string()))?;

    purge(&state).await;
    Ok(Json(ok_data(&updated)))
}

/// DELETE /api/v1/sustainability/esg/{id} (auth required)
pub async fn delete(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    if !state.docs.delete_esg(id).await? {
        return Err(AppError::NotFound("ESG report not found".to_string()));
    }

    purge(&state).await;
    info!(%id, "esg report deleted");
    Ok(Json(json!({
        "success": true,
        "message": "ESG report deleted"
    })))
}

/// GET /api/v1/sustainability/metrics
pub async fn metrics_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = filter_from_query(&params)?;

    let mut fields = Vec::new();
    if let Some(company) = &filter.company {
        fields.push(("company", company.clone()));
    }
    if let Some(year) = filter.year {
        fields.push(("year", year.to_string()));
    }
    let key = cache_key(METRICS_PREFIX, &fields);

    if let Some(cached) = state.cache.get::<Value>(&key).await {
        return Ok(Json(cached));
    }

    let summary = state.docs.esg_metrics_summary(&filter).await?;
    let response = ok_data(&summary);
    state.cache.set(&key, &response, METRICS_TTL_SECS).await;
    Ok(Json(response))
}
