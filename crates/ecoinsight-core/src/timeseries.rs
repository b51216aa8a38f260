use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::climate::{DataType, Metadata};
use crate::error::CoreError;

/// Hard cap on bucket rows returned by an aggregate query. Protects the
/// relational store from unbounded scan cost on wide ranges; callers page
/// by narrowing the range.
pub const MAX_BUCKETS: i64 = 500;

pub const DEFAULT_BUCKET_INTERVAL: &str = "1 hour";

/// An append-only raw sensor point bound for the `climate_timeseries` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesPoint {
    pub location: String,
    pub data_type: DataType,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
    pub source: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// One aggregated bucket: fixed-width interval with avg/min/max of values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesBucket {
    pub bucket: DateTime<Utc>,
    pub value_avg: f64,
    pub value_min: f64,
    pub value_max: f64,
}

/// Validate a bucket interval expression of the form `"<n> <unit>"`.
///
/// The value is bound as an `::interval` query parameter, but only this
/// closed pattern is accepted so arbitrary interval syntax never reaches
/// the store.
pub fn validate_bucket_interval(expr: &str) -> Result<(), CoreError> {
    const UNITS: [&str; 5] = ["second", "minute", "hour", "day", "week"];

    let reject = || CoreError::InvalidBucketInterval(expr.to_string());

    let (count, unit) = expr.trim().split_once(' ').ok_or_else(reject)?;
    let count: u32 = count.parse().map_err(|_| reject())?;
    if count == 0 {
        return Err(reject());
    }
    let unit = unit.trim().strip_suffix('s').unwrap_or(unit.trim());
    if !UNITS.contains(&unit) {
        return Err(reject());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_singular_and_plural_units() {
        for expr in ["1 hour", "15 minutes", "1 day", "2 weeks", "30 seconds"] {
            assert!(validate_bucket_interval(expr).is_ok(), "{expr}");
        }
        assert!(validate_bucket_interval(DEFAULT_BUCKET_INTERVAL).is_ok());
    }

    #[test]
    fn rejects_malformed_intervals() {
        for expr in ["hour", "0 hours", "-1 hour", "1 fortnight", "1; DROP TABLE", ""] {
            assert!(validate_bucket_interval(expr).is_err(), "{expr}");
        }
    }
}
