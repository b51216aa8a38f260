use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use ecoinsight_core::climate::{ClimateObservation, DataType, Metadata};

use crate::{like_pattern, DocStore};

const COLUMNS: &str =
    "id, location, data_type, ts, value, unit, source, metadata, created_at, updated_at";

/// Filters for the climate list query. Text is substring/case-insensitive,
/// the enum is exact, time bounds are inclusive and independent.
#[derive(Debug, Default, Clone)]
pub struct ClimateFilter {
    pub location: Option<String>,
    pub data_type: Option<DataType>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

pub struct CreateClimateParams {
    pub location: String,
    pub data_type: DataType,
    pub timestamp: DateTime<Utc>,
    pub value: serde_json::Value,
    pub unit: String,
    pub source: String,
    pub metadata: Metadata,
}

/// Partial update. Only fields from the handler's allow-list ever arrive
/// here; `None` means "leave unchanged".
#[derive(Debug, Default)]
pub struct ClimatePatch {
    pub location: Option<String>,
    pub data_type: Option<DataType>,
    pub timestamp: Option<DateTime<Utc>>,
    pub value: Option<serde_json::Value>,
    pub unit: Option<String>,
    pub source: Option<String>,
    pub metadata: Option<Metadata>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ClimateFilter) {
    if let Some(location) = &filter.location {
        qb.push(" AND location ILIKE ").push_bind(like_pattern(location));
    }
    if let Some(data_type) = filter.data_type {
        qb.push(" AND data_type = ").push_bind(data_type.as_str());
    }
    if let Some(start) = filter.start {
        qb.push(" AND ts >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        qb.push(" AND ts <= ").push_bind(end);
    }
}

fn row_to_observation(row: &PgRow) -> Result<ClimateObservation> {
    let data_type: String = row.try_get("data_type")?;
    let metadata: serde_json::Value = row.try_get("metadata")?;
    Ok(ClimateObservation {
        id: row.try_get("id")?,
        location: row.try_get("location")?,
        data_type: data_type.parse()?,
        timestamp: row.try_get("ts")?,
        value: row.try_get("value")?,
        unit: row.try_get("unit")?,
        source: row.try_get("source")?,
        metadata: serde_json::from_value(metadata)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl DocStore {
    /// Filtered page ordered by observation time descending, plus the
    /// total match count for the pagination envelope.
    pub async fn list_climate(
        &self,
        filter: &ClimateFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ClimateObservation>, i64)> {
        let mut count_qb =
            QueryBuilder::new("SELECT COUNT(*) FROM climate_observations WHERE 1=1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::new(format!(
            "SELECT {COLUMNS} FROM climate_observations WHERE 1=1"
        ));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ts DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(row_to_observation)
            .collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn get_climate(&self, id: Uuid) -> Result<Option<ClimateObservation>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM climate_observations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_observation).transpose()
    }

    pub async fn create_climate(
        &self,
        params: CreateClimateParams,
    ) -> Result<ClimateObservation> {
        let id = Uuid::new_v4();
        let metadata = serde_json::to_value(&params.metadata)?;
        let row = sqlx::query(&format!(
            "INSERT INTO climate_observations \
             (id, location, data_type, ts, value, unit, source, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&params.location)
        .bind(params.data_type.as_str())
        .bind(params.timestamp)
        .bind(&params.value)
        .bind(&params.unit)
        .bind(&params.source)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;
        row_to_observation(&row)
    }

    /// Apply a partial update; `None` when no row has that id so the
    /// handler can 404 distinctly from validation failure.
    pub async fn update_climate(
        &self,
        id: Uuid,
        patch: ClimatePatch,
    ) -> Result<Option<ClimateObservation>> {
        let mut qb =
            QueryBuilder::new("UPDATE climate_observations SET updated_at = NOW()");
        if let Some(location) = patch.location {
            qb.push(", location = ").push_bind(location);
        }
        if let Some(data_type) = patch.data_type {
            qb.push(", data_type = ").push_bind(data_type.as_str());
        }
        if let Some(timestamp) = patch.timestamp {
            qb.push(", ts = ").push_bind(timestamp);
        }
        if let Some(value) = patch.value {
            qb.push(", value = ").push_bind(value);
        }
        if let Some(unit) = patch.unit {
            qb.push(", unit = ").push_bind(unit);
        }
        if let Some(source) = patch.source {
            qb.push(", source = ").push_bind(source);
        }
        if let Some(metadata) = patch.metadata {
            qb.push(", metadata = ").push_bind(serde_json::to_value(&metadata)?);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(format!(" RETURNING {COLUMNS}"));

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_observation).transpose()
    }

    /// `true` if a row was deleted; `false` lets the handler 404.
    pub async fn delete_climate(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM climate_observations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
