use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Subset of the OpenWeatherMap current-weather response we consume.
#[derive(Debug, Deserialize)]
pub struct OwmResponse {
    pub name: String,
    pub main: OwmMain,
    pub weather: Vec<OwmWeather>,
    pub wind: OwmWind,
    /// Observation time, unix seconds.
    pub dt: i64,
}

#[derive(Debug, Deserialize)]
pub struct OwmMain {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Deserialize)]
pub struct OwmWeather {
    pub main: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct OwmWind {
    pub speed: f64,
}

/// Normalized weather reading served to clients and cached verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPayload {
    pub city: String,
    pub temp_celsius: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub weather: String,
    pub description: String,
    pub wind_speed: f64,
    pub timestamp: i64,
}

impl WeatherPayload {
    fn from_owm(resp: OwmResponse) -> Self {
        let (weather, description) = resp
            .weather
            .into_iter()
            .next()
            .map(|w| (w.main, w.description))
            .unwrap_or_default();
        Self {
            city: resp.name,
            temp_celsius: resp.main.temp,
            humidity: resp.main.humidity,
            pressure: resp.main.pressure,
            weather,
            description,
            wind_speed: resp.wind.speed,
            timestamp: resp.dt,
        }
    }
}

/// Fetch current weather for a city, in metric units.
pub async fn fetch_current_weather(
    http: &reqwest::Client,
    api_key: &str,
    city: &str,
) -> Result<WeatherPayload, AppError> {
    let resp = http
        .get(BASE_URL)
        .query(&[("q", city), ("appid", api_key), ("units", "metric")])
        .send()
        .await
        .map_err(|e| {
            warn!(city, error = %e, "openweathermap request failed");
            AppError::Upstream { status: None }
        })?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        warn!(city, status, "openweathermap returned an error status");
        return Err(AppError::Upstream {
            status: Some(status),
        });
    }

    let parsed: OwmResponse = resp.json().await.map_err(|e| {
        warn!(city, error = %e, "openweathermap response did not parse");
        AppError::Upstream { status: None }
    })?;

    Ok(WeatherPayload::from_owm(parsed))
}
