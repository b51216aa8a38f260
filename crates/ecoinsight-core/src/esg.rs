use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Annual,
    Quarterly,
    Sustainability,
    Esg,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Annual => "annual",
            ReportType::Quarterly => "quarterly",
            ReportType::Sustainability => "sustainability",
            ReportType::Esg => "esg",
        }
    }
}

impl FromStr for ReportType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "annual" => Ok(ReportType::Annual),
            "quarterly" => Ok(ReportType::Quarterly),
            "sustainability" => Ok(ReportType::Sustainability),
            "esg" => Ok(ReportType::Esg),
            other => Err(CoreError::UnknownReportType(other.to_string())),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nested environmental/social/governance numeric fields.
///
/// Each pillar is an open numeric map rather than a fixed struct: reporting
/// frameworks disagree on field names, and the store keeps them as JSONB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsgMetrics {
    #[serde(default)]
    pub environmental: BTreeMap<String, f64>,
    #[serde(default)]
    pub social: BTreeMap<String, f64>,
    #[serde(default)]
    pub governance: BTreeMap<String, f64>,
}

/// A stored ESG report. Mirrors the `esg_reports` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsgReport {
    pub id: Uuid,
    pub company: String,
    pub year: i32,
    pub report_type: ReportType,
    pub metrics: EsgMetrics,
    pub score: Option<f64>,
    pub source: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate summary over a filtered set of reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    pub avg_score: f64,
    pub total_reports: i64,
    pub companies: Vec<String>,
    pub years: Vec<i32>,
}

impl MetricsSummary {
    /// The shape returned when no report matches the filter.
    pub fn empty() -> Self {
        Self {
            avg_score: 0.0,
            total_reports: 0,
            companies: Vec::new(),
            years: Vec::new(),
        }
    }
}

/// Score must stay within the 0–100 band the schema promises.
pub fn validate_score(score: f64) -> Result<(), String> {
    if !(0.0..=100.0).contains(&score) {
        return Err(format!("score must be between 0 and 100, got {score}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_type_round_trips() {
        for s in ["annual", "quarterly", "sustainability", "esg"] {
            assert_eq!(s.parse::<ReportType>().unwrap().as_str(), s);
        }
        assert!("monthly".parse::<ReportType>().is_err());
    }

    #[test]
    fn score_band_enforced() {
        assert!(validate_score(0.0).is_ok());
        assert!(validate_score(100.0).is_ok());
        assert!(validate_score(100.1).is_err());
        assert!(validate_score(-1.0).is_err());
    }

    #[test]
    fn metrics_deserialize_with_missing_pillars() {
        let m: EsgMetrics =
            serde_json::from_value(serde_json::json!({ "environmental": { "carbonEmissions": 12.0 } }))
                .unwrap();
        assert_eq!(m.environmental.get("carbonEmissions"), Some(&12.0));
        assert!(m.social.is_empty());
    }
}
