use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    auth, error::AppError, routes, routes::client_ip, state::AppState,
};

/// Global sliding-window rate limit, keyed by client IP. The live proxy
/// routes additionally pass through their own tighter limiter inside the
/// handler.
async fn rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(req.headers());
    if !state.check_rate_limit(&ip).await {
        return AppError::RateLimited.into_response();
    }
    next.run(req).await
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — origins from config, permissive when unset.
/// 3. Rate limiter — global sliding window keyed by client IP.
pub fn build_app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/auth/register",
            axum::routing::post(auth::handlers::register),
        )
        .route("/auth/login", axum::routing::post(auth::handlers::login))
        .route(
            "/climate",
            get(routes::climate::list).post(routes::climate::create),
        )
        // Static segments take precedence over `{id}`, so the live proxy
        // routes can share the /climate prefix.
        .route("/climate/weather/live", get(routes::live::weather))
        .route("/climate/air-quality/live", get(routes::live::air_quality))
        .route(
            "/climate/{id}",
            get(routes::climate::get_by_id)
                .put(routes::climate::update)
                .delete(routes::climate::delete),
        )
        .route(
            "/sustainability/esg",
            get(routes::esg::list).post(routes::esg::create),
        )
        .route(
            "/sustainability/esg/{id}",
            get(routes::esg::get_by_id)
                .put(routes::esg::update)
                .delete(routes::esg::delete),
        )
        .route("/sustainability/metrics", get(routes::esg::metrics_summary))
        .route(
            "/timeseries",
            get(routes::timeseries::query).post(routes::timeseries::insert),
        )
        .route("/health", get(routes::health::health))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit,
        ));

    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
