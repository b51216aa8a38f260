mod common;

use axum::http::StatusCode;
use tower::ServiceExt;

use common::{get_request, json_body, setup};

#[tokio::test]
async fn unreachable_stores_degrade_health_to_503() {
    let (_state, app) = setup();

    let response = app
        .oneshot(get_request("/api/v1/health"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["documentStore"], "down");
    assert_eq!(body["services"]["timeseriesStore"], "down");
    assert_eq!(body["services"]["cache"], "down");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (_state, app) = setup();

    let response = app
        .oneshot(get_request("/api/v1/nope"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
