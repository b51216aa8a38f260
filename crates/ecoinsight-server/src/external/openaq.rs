use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;

const BASE_URL: &str = "https://api.openaq.org/v2/measurements";

/// Pollutants we query for. One request per parameter, latest reading only.
const PARAMETERS: [&str; 2] = ["pm25", "pm10"];

#[derive(Debug, Deserialize)]
struct AqResponse {
    results: Vec<AqMeasurement>,
}

#[derive(Debug, Deserialize)]
struct AqMeasurement {
    location: String,
    parameter: String,
    value: f64,
    unit: String,
    country: Option<String>,
    coordinates: Option<Coordinates>,
    date: AqDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct AqDate {
    utc: String,
}

/// A single pollutant reading within the normalized payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollutantReading {
    pub value: f64,
    pub unit: String,
    pub timestamp: String,
}

/// Normalized air-quality snapshot: one entry per pollutant that had data,
/// station identity taken from the first reading seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityPayload {
    pub city: String,
    pub location: String,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub measurements: BTreeMap<String, PollutantReading>,
    /// Most recent reading time among the measurements.
    pub timestamp: String,
}

/// Fetch the latest PM2.5 and PM10 readings for a city from OpenAQ.
///
/// Returns `Ok(None)` when the provider has no measurements for the city.
/// A pollutant with no data is simply absent from the map; only a city
/// with no data at all is a miss.
pub async fn fetch_air_quality(
    http: &reqwest::Client,
    city: &str,
) -> Result<Option<AirQualityPayload>, AppError> {
    let mut latest: Vec<AqMeasurement> = Vec::new();

    for parameter in PARAMETERS {
        let resp = http
            .get(BASE_URL)
            .query(&[
                ("city", city),
                ("parameter", parameter),
                ("limit", "1"),
                ("sort", "desc"),
                ("order_by", "datetime"),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!(city, parameter, error = %e, "openaq request failed");
                AppError::Upstream { status: None }
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            warn!(city, parameter, status, "openaq returned an error status");
            return Err(AppError::Upstream {
                status: Some(status),
            });
        }

        let parsed: AqResponse = resp.json().await.map_err(|e| {
            warn!(city, parameter, error = %e, "openaq response did not parse");
            AppError::Upstream { status: None }
        })?;

        latest.extend(parsed.results.into_iter().next());
    }

    Ok(normalize(city, latest))
}

fn normalize(city: &str, readings: Vec<AqMeasurement>) -> Option<AirQualityPayload> {
    let first = readings.first()?;
    let location = first.location.clone();
    let country = first.country.clone();
    let coordinates = first.coordinates.clone();

    let mut measurements = BTreeMap::new();
    let mut timestamp = String::new();
    for m in readings {
        if m.date.utc > timestamp {
            timestamp = m.date.utc.clone();
        }
        measurements.insert(
            m.parameter,
            PollutantReading {
                value: m.value,
                unit: m.unit,
                timestamp: m.date.utc,
            },
        );
    }

    Some(AirQualityPayload {
        city: city.to_string(),
        location,
        country,
        coordinates,
        measurements,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(parameter: &str, value: f64, utc: &str) -> AqMeasurement {
        AqMeasurement {
            location: "London Bloomsbury".to_string(),
            parameter: parameter.to_string(),
            value,
            unit: "µg/m³".to_string(),
            country: Some("GB".to_string()),
            coordinates: Some(Coordinates {
                latitude: 51.52,
                longitude: -0.13,
            }),
            date: AqDate {
                utc: utc.to_string(),
            },
        }
    }

    #[test]
    fn provider_measurement_parses() {
        let raw = serde_json::json!({
            "meta": { "name": "openaq-api", "page": 1 },
            "results": [{
                "locationId": 1234,
                "location": "London Bloomsbury",
                "parameter": "pm25",
                "value": 9.4,
                "unit": "µg/m³",
                "coordinates": { "latitude": 51.52, "longitude": -0.13 },
                "date": { "utc": "2024-06-01T11:00:00+00:00", "local": "2024-06-01T12:00:00+01:00" },
                "country": "GB",
                "city": "London"
            }]
        });
        let resp: AqResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.results.len(), 1);
        let m = &resp.results[0];
        assert_eq!(m.parameter, "pm25");
        assert_eq!(m.value, 9.4);
        assert_eq!(m.date.utc, "2024-06-01T11:00:00+00:00");
    }

    #[test]
    fn normalize_merges_pollutants_and_keeps_latest_timestamp() {
        let payload = normalize(
            "London",
            vec![
                sample("pm25", 9.4, "2024-06-01T11:00:00+00:00"),
                sample("pm10", 18.2, "2024-06-01T12:00:00+00:00"),
            ],
        )
        .unwrap();
        assert_eq!(payload.city, "London");
        assert_eq!(payload.measurements.len(), 2);
        assert_eq!(payload.measurements["pm25"].value, 9.4);
        assert_eq!(payload.timestamp, "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn normalize_with_no_readings_is_none() {
        assert!(normalize("Nowhere", Vec::new()).is_none());
    }

    #[test]
    fn payload_serializes_camel_case() {
        let payload = normalize("London", vec![sample("pm25", 9.4, "2024-06-01T11:00:00+00:00")])
            .unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["city"], "London");
        assert_eq!(json["location"], "London Bloomsbury");
        assert!(json["measurements"]["pm25"].get("timestamp").is_some());
    }
}
