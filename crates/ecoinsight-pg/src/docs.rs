use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::schema::DOCSTORE_INIT_SQL;

/// Pool acquire timeout. Exhaustion surfaces as a resource-unavailable
/// error on the requesting operation rather than an unbounded wait.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// The document store: climate observations, ESG reports and user
/// credentials behind one process-wide Postgres pool.
///
/// Cheap to clone; all entity operations live in `climate.rs`, `esg.rs`
/// and `users.rs` as `impl DocStore` blocks.
#[derive(Clone)]
pub struct DocStore {
    pub(crate) pool: PgPool,
}

impl DocStore {
    /// Connect eagerly and run the idempotent schema DDL. Used at startup,
    /// where an unreachable store is fatal.
    pub async fn connect(uri: &str, max_connections: u32) -> Result<Self> {
        let store = Self::connect_lazy(uri, max_connections)?;
        store
            .pool
            .execute(DOCSTORE_INIT_SQL)
            .await
            .context("docstore schema init failed")?;
        info!(max_connections, "document store ready");
        Ok(store)
    }

    /// Build the pool without touching the network; connections are
    /// established on first use. Intended for tests.
    pub fn connect_lazy(uri: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(uri)
            .context("failed to create docstore connection pool")?;
        Ok(Self { pool })
    }

    /// `SELECT 1` liveness probe for the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
