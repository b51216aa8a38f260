use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool, Row};
use tracing::{info, warn};

use ecoinsight_core::climate::DataType;
use ecoinsight_core::timeseries::{SeriesBucket, TimeseriesPoint, MAX_BUCKETS};

use crate::schema::{
    CREATE_HYPERTABLE, SERIES_DROP_SQL, SERIES_INIT_SQL, TIMESCALE_EXTENSION_CHECK,
};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// The raw time-series store: an append-only table on its own pool,
/// promoted to a TimescaleDB hypertable when the extension is present.
#[derive(Clone)]
pub struct SeriesStore {
    pool: PgPool,
}

impl SeriesStore {
    /// Connect eagerly and bootstrap the table.
    ///
    /// `reset` drops and recreates the table first — destructive, opt-in
    /// only via `ECOINSIGHT_TIMESERIES_RESET=true`.
    pub async fn connect(uri: &str, max_connections: u32, reset: bool) -> Result<Self> {
        let store = Self::connect_lazy(uri, max_connections)?;

        if reset {
            warn!("ECOINSIGHT_TIMESERIES_RESET=true: dropping climate_timeseries");
            store.pool.execute(SERIES_DROP_SQL).await?;
        }
        store
            .pool
            .execute(SERIES_INIT_SQL)
            .await
            .context("timeseries schema init failed")?;

        // Promote to a hypertable when TimescaleDB is installed; without it
        // the table still works but time_bucket queries will fail.
        let extensions: i64 = sqlx::query_scalar(TIMESCALE_EXTENSION_CHECK)
            .fetch_one(&store.pool)
            .await?;
        if extensions > 0 {
            if let Err(e) = store.pool.execute(CREATE_HYPERTABLE).await {
                if !e.to_string().contains("already a hypertable") {
                    return Err(e.into());
                }
            }
            info!(max_connections, "time-series store ready (hypertable)");
        } else {
            warn!("timescaledb extension not installed; bucketed queries will fail");
        }
        Ok(store)
    }

    pub fn connect_lazy(uri: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(uri)
            .context("failed to create timeseries connection pool")?;
        Ok(Self { pool })
    }

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Append one validated point; returns the generated row id.
    pub async fn insert_point(&self, point: &TimeseriesPoint) -> Result<i64> {
        let metadata = serde_json::to_value(&point.metadata)?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO climate_timeseries \
             (location, data_type, ts, value, unit, source, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&point.location)
        .bind(point.data_type.as_str())
        .bind(point.timestamp)
        .bind(point.value)
        .bind(&point.unit)
        .bind(&point.source)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Bucketed avg/min/max over an exact location + dataType match and an
    /// inclusive time range, newest bucket first, capped at 500 buckets.
    ///
    /// `bucket_interval` must already be validated against the closed
    /// `"<n> <unit>"` pattern; it is bound as a cast parameter, never
    /// interpolated.
    pub async fn bucket_query(
        &self,
        location: &str,
        data_type: DataType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bucket_interval: &str,
    ) -> Result<Vec<SeriesBucket>> {
        let rows = sqlx::query(
            "SELECT time_bucket(($1::text)::interval, ts) AS bucket, \
                    AVG(value) AS value_avg, \
                    MIN(value) AS value_min, \
                    MAX(value) AS value_max \
             FROM climate_timeseries \
             WHERE location = $2 AND data_type = $3 AND ts BETWEEN $4 AND $5 \
             GROUP BY bucket \
             ORDER BY bucket DESC \
             LIMIT $6",
        )
        .bind(bucket_interval)
        .bind(location)
        .bind(data_type.as_str())
        .bind(start)
        .bind(end)
        .bind(MAX_BUCKETS)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(SeriesBucket {
                    bucket: row.try_get("bucket")?,
                    value_avg: row.try_get("value_avg")?,
                    value_min: row.try_get("value_min")?,
                    value_max: row.try_get("value_max")?,
                })
            })
            .collect()
    }
}
