use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use ecoinsight_core::esg::{EsgMetrics, EsgReport, MetricsSummary, ReportType};

use crate::{like_pattern, DocStore};

const COLUMNS: &str =
    "id, company, year, report_type, metrics, score, source, verified, created_at, updated_at";

#[derive(Debug, Default, Clone)]
pub struct EsgFilter {
    pub company: Option<String>,
    pub year: Option<i32>,
    pub report_type: Option<ReportType>,
}

pub struct CreateEsgParams {
    pub company: String,
    pub year: i32,
    pub report_type: ReportType,
    pub metrics: EsgMetrics,
    pub score: Option<f64>,
    pub source: String,
    pub verified: bool,
}

#[derive(Debug, Default)]
pub struct EsgPatch {
    pub company: Option<String>,
    pub year: Option<i32>,
    pub report_type: Option<ReportType>,
    pub metrics: Option<EsgMetrics>,
    pub score: Option<f64>,
    pub source: Option<String>,
    pub verified: Option<bool>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &EsgFilter) {
    if let Some(company) = &filter.company {
        qb.push(" AND company ILIKE ").push_bind(like_pattern(company));
    }
    if let Some(year) = filter.year {
        qb.push(" AND year = ").push_bind(year);
    }
    if let Some(report_type) = filter.report_type {
        qb.push(" AND report_type = ").push_bind(report_type.as_str());
    }
}

fn row_to_report(row: &PgRow) -> Result<EsgReport> {
    let report_type: String = row.try_get("report_type")?;
    let metrics: serde_json::Value = row.try_get("metrics")?;
    Ok(EsgReport {
        id: row.try_get("id")?,
        company: row.try_get("company")?,
        year: row.try_get("year")?,
        report_type: report_type.parse()?,
        metrics: serde_json::from_value(metrics)?,
        score: row.try_get("score")?,
        source: row.try_get("source")?,
        verified: row.try_get("verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl DocStore {
    /// Filtered page, newest reporting year first, companies alphabetical
    /// within a year.
    pub async fn list_esg(
        &self,
        filter: &EsgFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<EsgReport>, i64)> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM esg_reports WHERE 1=1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM esg_reports WHERE 1=1"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY year DESC, company ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb.build().fetch_all(&self.pool).await?;
        let items = rows.iter().map(row_to_report).collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn get_esg(&self, id: Uuid) -> Result<Option<EsgReport>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM esg_reports WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_report).transpose()
    }

    pub async fn create_esg(&self, params: CreateEsgParams) -> Result<EsgReport> {
        let id = Uuid::new_v4();
        let metrics = serde_json::to_value(&params.metrics)?;
        let row = sqlx::query(&format!(
            "INSERT INTO esg_reports \
             (id, company, year, report_type, metrics, score, source, verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&params.company)
        .bind(params.year)
        .bind(params.report_type.as_str())
        .bind(metrics)
        .bind(params.score)
        .bind(&params.source)
        .bind(params.verified)
        .fetch_one(&self.pool)
        .await?;
        row_to_report(&row)
    }

    pub async fn update_esg(&self, id: Uuid, patch: EsgPatch) -> Result<Option<EsgReport>> {
        let mut qb = QueryBuilder::new("UPDATE esg_reports SET updated_at = NOW()");
        if let Some(company) = patch.company {
            qb.push(", company = ").push_bind(company);
        }
        if let Some(year) = patch.year {
            qb.push(", year = ").push_bind(year);
        }
        if let Some(report_type) = patch.report_type {
            qb.push(", report_type = ").push_bind(report_type.as_str());
        }
        if let Some(metrics) = patch.metrics {
            qb.push(", metrics = ").push_bind(serde_json::to_value(&metrics)?);
        }
        if let Some(score) = patch.score {
            qb.push(", score = ").push_bind(score);
        }
        if let Some(source) = patch.source {
            qb.push(", source = ").push_bind(source);
        }
        if let Some(verified) = patch.verified {
            qb.push(", verified = ").push_bind(verified);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(format!(" RETURNING {COLUMNS}"));

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_report).transpose()
    }

    pub async fn delete_esg(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM esg_reports WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Aggregate summary over the filtered set: average score, report
    /// count, distinct companies and reporting years.
    pub async fn esg_metrics_summary(&self, filter: &EsgFilter) -> Result<MetricsSummary> {
        let mut qb = QueryBuilder::new(
            "SELECT AVG(score) AS avg_score, \
                    COUNT(*) AS total_reports, \
                    ARRAY_AGG(DISTINCT company) AS companies, \
                    ARRAY_AGG(DISTINCT year) AS years \
             FROM esg_reports WHERE 1=1",
        );
        push_filters(&mut qb, filter);

        let row = qb.build().fetch_one(&self.pool).await?;
        let total_reports: i64 = row.try_get("total_reports")?;
        if total_reports == 0 {
            return Ok(MetricsSummary::empty());
        }
        Ok(MetricsSummary {
            avg_score: row.try_get::<Option<f64>, _>("avg_score")?.unwrap_or(0.0),
            total_reports,
            companies: row
                .try_get::<Option<Vec<String>>, _>("companies")?
                .unwrap_or_default(),
            years: row
                .try_get::<Option<Vec<i32>>, _>("years")?
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_compile_to_expected_sql() {
        let filter = EsgFilter {
            company: Some("Acme".to_string()),
            year: Some(2024),
            report_type: Some(ReportType::Annual),
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM esg_reports WHERE 1=1");
        push_filters(&mut qb, &filter);
        let sql = qb.sql();
        assert!(sql.contains("company ILIKE"));
        assert!(sql.contains("year ="));
        assert!(sql.contains("report_type ="));
    }
}
