use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

fn status_of(result: &anyhow::Result<()>, service: &str) -> &'static str {
    match result {
        Ok(()) => "up",
        Err(e) => {
            warn!(service, error = %e, "health probe failed");
            "down"
        }
    }
}

/// GET /api/v1/health
///
/// Probes all three stores concurrently. Any failing probe degrades the
/// whole response to 503 so load balancers stop routing here.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (docs, series, cache) =
        tokio::join!(state.docs.ping(), state.series.ping(), state.cache.ping());

    let services = json!({
        "documentStore": status_of(&docs, "documentStore"),
        "timeseriesStore": status_of(&series, "timeseriesStore"),
        "cache": status_of(&cache, "cache"),
    });

    let healthy = docs.is_ok() && series.is_ok() && cache.is_ok();
    let (code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (code, Json(json!({ "status": status, "services": services })))
}
