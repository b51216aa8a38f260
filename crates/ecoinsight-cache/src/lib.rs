use anyhow::{Context, Result};
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

/// Cache-key prefixes, one per query family. Mutations purge everything
/// under the matching prefix.
pub const CLIMATE_PREFIX: &str = "climate";
pub const ESG_PREFIX: &str = "esg";
pub const METRICS_PREFIX: &str = "metrics";
pub const WEATHER_LIVE_PREFIX: &str = "weather_live";
pub const AQ_LIVE_PREFIX: &str = "aq_live";

const SCAN_COUNT: usize = 250;
const DEL_BATCH: usize = 1000;

/// Build a deterministic cache key: field names sorted lexicographically,
/// rendered as `name:value`, joined with `|`, behind the family prefix.
///
/// Two logically identical queries hash to the same key regardless of the
/// order the client supplied its parameters in.
pub fn cache_key(prefix: &str, fields: &[(&str, String)]) -> String {
    let mut pairs: Vec<&(&str, String)> = fields.iter().collect();
    pairs.sort_by_key(|(name, _)| *name);
    let joined = pairs
        .iter()
        .map(|(name, value)| format!("{name}:{value}"))
        .collect::<Vec<_>>()
        .join("|");
    format!("{prefix}:{joined}")
}

/// Redis-backed result cache.
///
/// The cache is never authoritative: every value is re-derivable from the
/// stores, so every Redis failure here degrades to cache-miss behavior and
/// is logged, never propagated to the calling request.
pub struct ResultCache {
    pool: Pool,
}

impl ResultCache {
    /// Connect and verify the server responds to PING.
    ///
    /// Used at startup, where an unreachable cache is fatal.
    pub async fn connect(url: &str) -> Result<Self> {
        let cache = Self::connect_lazy(url)?;
        cache.ping().await.context("redis PING failed")?;
        Ok(cache)
    }

    /// Build the pool without touching the network. Connections are
    /// established on first use. Intended for tests and degraded startup
    /// paths.
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .context("failed to create redis connection pool")?;
        Ok(Self { pool })
    }

    /// Liveness probe for the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.get().await?;
        redis::cmd("PING").query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    /// Fetch and deserialize a cached value. Any error (pool, network,
    /// malformed JSON) is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_inner(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "cache get failed, treating as miss");
                None
            }
        }
    }

    async fn get_inner<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.pool.get().await?;
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and store a value with a TTL. Failures are logged and
    /// swallowed; the caller already has the value it wanted to cache.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        if let Err(e) = self.set_inner(key, value, ttl_secs).await {
            warn!(key, error = %e, "cache set failed");
        }
    }

    async fn set_inner<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.pool.get().await?;
        let _: () = conn.set_ex(key, serialized, ttl_secs as usize).await?;
        Ok(())
    }

    /// Remove a single key.
    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.delete_inner(key).await {
            warn!(key, error = %e, "cache delete failed");
        }
    }

    async fn delete_inner(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let _: i64 = conn.del(key).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.exists_inner(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key, error = %e, "cache exists failed");
                false
            }
        }
    }

    async fn exists_inner(&self, key: &str) -> Result<bool> {
        let mut conn = self.pool.get().await?;
        let found: i64 = conn.exists(key).await?;
        Ok(found == 1)
    }

    /// Delete every key matching a glob pattern, e.g. `climate:*`.
    ///
    /// Enumerates with an incremental SCAN (COUNT 250) so the store is
    /// never blocked, deleting in batches of 1000. A failing purge never
    /// fails the calling mutation: TTL expiry bounds any staleness.
    pub async fn delete_by_pattern(&self, pattern: &str) {
        match self.delete_by_pattern_inner(pattern).await {
            Ok(deleted) if deleted > 0 => {
                debug!(pattern, deleted, "cache purge complete");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(pattern, error = %e, "cache purge failed");
            }
        }
    }

    async fn delete_by_pattern_inner(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.pool.get().await?;
        let mut cursor: u64 = 0;
        let mut pending: Vec<String> = Vec::new();
        let mut deleted: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            pending.extend(keys);

            if pending.len() >= DEL_BATCH {
                let batch = std::mem::take(&mut pending);
                deleted += batch.len() as u64;
                let _: i64 = conn.del(batch).await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        if !pending.is_empty() {
            deleted += pending.len() as u64;
            let _: i64 = conn.del(pending).await?;
        }
        Ok(deleted)
    }
}
