//! SQL DDL for both Postgres pools. All statements are idempotent
//! (`IF NOT EXISTS`) so running them on every startup is safe.

/// Document-store tables: schema-flexible climate/ESG documents (open
/// fields live in JSONB columns) plus user credentials.
pub const DOCSTORE_INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS climate_observations (
    id UUID PRIMARY KEY,
    location TEXT NOT NULL,
    data_type TEXT NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    value JSONB NOT NULL,
    unit TEXT NOT NULL,
    source TEXT NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_climate_location_type_ts
    ON climate_observations (location, data_type, ts DESC);

CREATE TABLE IF NOT EXISTS esg_reports (
    id UUID PRIMARY KEY,
    company TEXT NOT NULL,
    year INTEGER NOT NULL,
    report_type TEXT NOT NULL,
    metrics JSONB NOT NULL DEFAULT '{}'::jsonb,
    score DOUBLE PRECISION,
    source TEXT NOT NULL,
    verified BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_esg_company_year_type
    ON esg_reports (company, year, report_type);

CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// Append-only raw sensor points. No PRIMARY KEY on purpose: TimescaleDB
/// requires any unique constraint to include the partition column, and
/// rows are only ever read through bucketed aggregation.
pub const SERIES_INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS climate_timeseries (
    id BIGSERIAL,
    location TEXT NOT NULL,
    data_type TEXT NOT NULL,
    ts TIMESTAMPTZ NOT NULL,
    value DOUBLE PRECISION NOT NULL,
    unit TEXT NOT NULL,
    source TEXT NOT NULL,
    metadata JSONB NOT NULL DEFAULT '{}'::jsonb
);

CREATE INDEX IF NOT EXISTS idx_timeseries_location_type_ts
    ON climate_timeseries (location, data_type, ts DESC);
"#;

pub const SERIES_DROP_SQL: &str = "DROP TABLE IF EXISTS climate_timeseries";

pub const TIMESCALE_EXTENSION_CHECK: &str =
    "SELECT COUNT(*) FROM pg_extension WHERE extname = 'timescaledb'";

pub const CREATE_HYPERTABLE: &str =
    "SELECT create_hypertable('climate_timeseries', 'ts', if_not_exists => TRUE, migrate_data => TRUE)";
