use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Closed set of climate observation kinds. Checked at the HTTP boundary
/// before any store call; the stores only ever see valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Weather,
    AirQuality,
    Emissions,
    Temperature,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::Weather,
        DataType::AirQuality,
        DataType::Emissions,
        DataType::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Weather => "weather",
            DataType::AirQuality => "air_quality",
            DataType::Emissions => "emissions",
            DataType::Temperature => "temperature",
        }
    }
}

impl FromStr for DataType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weather" => Ok(DataType::Weather),
            "air_quality" => Ok(DataType::AirQuality),
            "emissions" => Ok(DataType::Emissions),
            "temperature" => Ok(DataType::Temperature),
            other => Err(CoreError::UnknownDataType(other.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open key/value blob carried on documents and time-series rows.
///
/// Deliberately not a fixed structure: upstream adapters and clients attach
/// arbitrary context (humidity, coordinates, ...). Stored as JSONB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub BTreeMap<String, serde_json::Value>);

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }
}

/// A stored climate observation. Mirrors the `climate_observations` table.
///
/// `value` is a raw JSON value: a plain number for most observations, but
/// structured payloads are allowed (the original data contains both).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateObservation {
    pub id: Uuid,
    pub location: String,
    pub data_type: DataType,
    pub timestamp: DateTime<Utc>,
    pub value: serde_json::Value,
    pub unit: String,
    pub source: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_round_trips_through_str() {
        for dt in DataType::ALL {
            assert_eq!(dt.as_str().parse::<DataType>().ok(), Some(dt));
        }
    }

    #[test]
    fn data_type_rejects_unknown_value() {
        assert!("humidity".parse::<DataType>().is_err());
    }

    #[test]
    fn observation_serializes_camel_case() {
        let obs = ClimateObservation {
            id: Uuid::nil(),
            location: "London".to_string(),
            data_type: DataType::AirQuality,
            timestamp: Utc::now(),
            value: serde_json::json!(12.5),
            unit: "µg/m³".to_string(),
            source: "OpenAQ".to_string(),
            metadata: Metadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["dataType"], "air_quality");
        assert!(json.get("createdAt").is_some());
    }
}
