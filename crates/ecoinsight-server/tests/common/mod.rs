//! Shared harness for router-level integration tests.
//!
//! These suites are hermetic: stores are built with lazy pools pointing
//! at unroutable addresses, so only code paths that fail before any store
//! I/O (validation, auth, rate limiting, missing upstream config, health
//! degradation) are exercised here. Store-backed scenarios live in
//! `store_integration.rs` behind env-guarded URIs.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

use ecoinsight_cache::ResultCache;
use ecoinsight_core::config::Config;
use ecoinsight_pg::{DocStore, SeriesStore};
use ecoinsight_server::app::build_app;
use ecoinsight_server::auth::jwt::encode_jwt;
use ecoinsight_server::state::AppState;

pub const TEST_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        port: 0,
        docstore_uri: "postgres://127.0.0.1:1/ecoinsight".to_string(),
        timeseries_uri: "postgres://127.0.0.1:1/ecoinsight_timeseries".to_string(),
        redis_uri: "redis://127.0.0.1:1".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        cors_origins: vec![],
        rate_limit_window_secs: 900,
        rate_limit_max: 100,
        live_rate_limit_max: 30,
        openweather_api_key: None,
        timeseries_reset: false,
        doc_pool_max: 2,
        series_pool_max: 2,
        rate_limit_disable: true,
    }
}

/// Router over unreachable stores. Nothing here touches the network until
/// a handler actually performs store I/O.
pub fn setup_with(config: Config) -> (Arc<AppState>, axum::Router) {
    let docs = DocStore::connect_lazy(&config.docstore_uri, config.doc_pool_max)
        .expect("lazy docstore pool");
    let series = SeriesStore::connect_lazy(&config.timeseries_uri, config.series_pool_max)
        .expect("lazy series pool");
    let cache = ResultCache::connect_lazy(&config.redis_uri).expect("lazy cache pool");
    let state = Arc::new(AppState::new(docs, series, cache, config).expect("state"));
    let app = build_app(Arc::clone(&state));
    (state, app)
}

pub fn setup() -> (Arc<AppState>, axum::Router) {
    setup_with(test_config())
}

pub fn bearer_token() -> String {
    encode_jwt(TEST_SECRET, Uuid::new_v4(), "user").expect("token")
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.10")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn authed_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", bearer_token()))
        .header("x-forwarded-for", "198.51.100.10")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", "198.51.100.10")
        .body(Body::empty())
        .expect("request")
}

pub async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json")
}
