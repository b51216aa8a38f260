use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use ecoinsight_cache::ResultCache;
use ecoinsight_pg::{DocStore, SeriesStore};
use ecoinsight_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ecoinsight=info".parse()?),
        )
        .json()
        .init();

    let cfg = ecoinsight_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Every endpoint depends on at least one of the three stores, so a
    // failed initial connect is fatal rather than a degraded start.
    let docs = DocStore::connect(&cfg.docstore_uri, cfg.doc_pool_max).await?;
    let series = SeriesStore::connect(
        &cfg.timeseries_uri,
        cfg.series_pool_max,
        cfg.timeseries_reset,
    )
    .await?;
    let cache = ResultCache::connect(&cfg.redis_uri).await?;
    info!("cache ready");

    let addr = format!("0.0.0.0:{}", cfg.port);
    let state = Arc::new(AppState::new(docs, series, cache, cfg)?);
    let app = ecoinsight_server::app::build_app(state);

    info!("EcoInsight listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
