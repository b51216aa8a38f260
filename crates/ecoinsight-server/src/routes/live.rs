use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::warn;

use ecoinsight_cache::{cache_key, AQ_LIVE_PREFIX, WEATHER_LIVE_PREFIX};
use ecoinsight_core::climate::{DataType, Metadata};
use ecoinsight_pg::climate::CreateClimateParams;

use crate::error::AppError;
use crate::external::openaq::{fetch_air_quality, AirQualityPayload};
use crate::external::openweather::{fetch_current_weather, WeatherPayload};
use crate::routes::{client_ip, query_param};
use crate::state::AppState;

/// Live readings go stale quickly; ten minutes also keeps us inside the
/// upstream providers' free-tier quotas.
const LIVE_TTL_SECS: u64 = 600;

fn require_city(params: &HashMap<String, String>) -> Result<&str, AppError> {
    query_param(params, "city")
        .ok_or_else(|| AppError::Validation("city query parameter is required".to_string()))
}

async fn check_live_limit(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if !state.check_live_rate_limit(&client_ip(headers)).await {
        return Err(AppError::RateLimited);
    }
    Ok(())
}

/// Fire-and-forget persistence of a derived observation. A failed write
/// never fails the live request; the client already has its data.
async fn persist_observation(state: &AppState, params: CreateClimateParams) {
    match state.docs.create_climate(params).await {
        Ok(created) => {
            // The new row changes what climate lists should return.
            state.cache.delete_by_pattern("climate:*").await;
            tracing::debug!(id = %created.id, "live reading persisted as observation");
        }
        Err(e) => warn!(error = %e, "failed to persist live reading"),
    }
}

fn weather_observation(payload: &WeatherPayload) -> CreateClimateParams {
    let mut metadata = Metadata::default();
    metadata.insert("humidity", json!(payload.humidity));
    metadata.insert("pressure", json!(payload.pressure));
    metadata.insert("weather", json!(payload.weather));
    metadata.insert("description", json!(payload.description));
    metadata.insert("windSpeed", json!(payload.wind_speed));
    CreateClimateParams {
        location: payload.city.clone(),
        data_type: DataType::Weather,
        timestamp: DateTime::from_timestamp(payload.timestamp, 0).unwrap_or_else(Utc::now),
        value: json!(payload.temp_celsius),
        unit: "°C".to_string(),
        source: "OpenWeatherMap".to_string(),
        metadata,
    }
}

fn air_quality_observation(payload: &AirQualityPayload) -> CreateClimateParams {
    let mut metadata = Metadata::default();
    metadata.insert("station", json!(payload.location));
    if let Some(country) = &payload.country {
        metadata.insert("country", json!(country));
    }
    CreateClimateParams {
        location: payload.city.clone(),
        data_type: DataType::AirQuality,
        timestamp: DateTime::parse_from_rfc3339(&payload.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        value: serde_json::to_value(&payload.measurements).unwrap_or(Value::Null),
        unit: "µg/m³".to_string(),
        source: "OpenAQ".to_string(),
        metadata,
    }
}

/// GET /api/v1/climate/weather/live
pub async fn weather(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let city = require_city(&params)?;
    check_live_limit(&state, &headers).await?;

    let key = cache_key(WEATHER_LIVE_PREFIX, &[("city", city.to_lowercase())]);
    if let Some(cached) = state.cache.get::<WeatherPayload>(&key).await {
        return Ok(Json(json!({
            "success": true,
            "source": "cache",
            "data": cached,
        })));
    }

    // Short-circuit before any network traffic when the key is absent.
    let api_key = state
        .config
        .openweather_api_key
        .as_deref()
        .ok_or_else(|| {
            AppError::Dependency("weather provider is not configured".to_string())
        })?;

    let payload = fetch_current_weather(&state.http, api_key, city).await?;
    persist_observation(&state, weather_observation(&payload)).await;
    state.cache.set(&key, &payload, LIVE_TTL_SECS).await;

    Ok(Json(json!({
        "success": true,
        "source": "live",
        "data": payload,
    })))
}

/// GET /api/v1/climate/air-quality/live
pub async fn air_quality(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let city = require_city(&params)?;
    check_live_limit(&state, &headers).await?;

    let key = cache_key(AQ_LIVE_PREFIX, &[("city", city.to_lowercase())]);
    if let Some(cached) = state.cache.get::<AirQualityPayload>(&key).await {
        return Ok(Json(json!({
            "success": true,
            "source": "cache",
            "data": cached,
        })));
    }

    let payload = fetch_air_quality(&state.http, city)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("no air quality measurements for {city}"))
        })?;
    persist_observation(&state, air_quality_observation(&payload)).await;
    state.cache.set(&key, &payload, LIVE_TTL_SECS).await;

    Ok(Json(json!({
        "success": true,
        "source": "live",
        "data": payload,
    })))
}
