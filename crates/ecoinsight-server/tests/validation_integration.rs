mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{authed_request, get_request, json_body, setup};

#[tokio::test]
async fn climate_create_rejects_unknown_data_type() {
    let (_state, app) = setup();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/climate",
            json!({
                "location": "London",
                "dataType": "humidity",
                "timestamp": "2024-06-01T12:00:00Z",
                "value": 17.3,
                "unit": "%",
                "source": "manual"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .expect("message")
        .contains("humidity"));
}

#[tokio::test]
async fn climate_create_rejects_malformed_timestamp() {
    let (_state, app) = setup();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/climate",
            json!({
                "location": "London",
                "dataType": "weather",
                "timestamp": "June 1st",
                "value": 17.3,
                "unit": "°C",
                "source": "manual"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn climate_update_rejects_unknown_field() {
    let (_state, app) = setup();

    let response = app
        .oneshot(authed_request(
            "PUT",
            "/api/v1/climate/0b944237-67ee-470a-869e-c97f2ddf7d59",
            json!({ "location": "Paris", "color": "blue" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .expect("message")
        .contains("color"));
}

#[tokio::test]
async fn esg_create_rejects_out_of_band_score() {
    let (_state, app) = setup();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/sustainability/esg",
            json!({
                "company": "Acme",
                "year": 2024,
                "reportType": "annual",
                "score": 120.0,
                "source": "filing"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn esg_create_rejects_unknown_report_type() {
    let (_state, app) = setup();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/sustainability/esg",
            json!({
                "company": "Acme",
                "year": 2024,
                "reportType": "monthly",
                "source": "filing"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn esg_update_rejects_year_outside_integer_range() {
    let (_state, app) = setup();

    // A huge zero-fraction float must be rejected, not saturated to
    // i32::MAX on the way into the store.
    let response = app
        .oneshot(authed_request(
            "PUT",
            "/api/v1/sustainability/esg/0b944237-67ee-470a-869e-c97f2ddf7d59",
            json!({ "year": 1e12 }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn esg_update_rejects_fractional_year() {
    let (_state, app) = setup();

    let response = app
        .oneshot(authed_request(
            "PUT",
            "/api/v1/sustainability/esg/0b944237-67ee-470a-869e-c97f2ddf7d59",
            json!({ "year": 2024.5 }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn timeseries_insert_rejects_non_numeric_value() {
    let (_state, app) = setup();

    // "abc" must fail validation, never coerce to 0 or NaN.
    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/timeseries",
            json!({
                "location": "London",
                "dataType": "temperature",
                "timestamp": "2024-06-01T12:00:00Z",
                "value": "abc",
                "unit": "°C",
                "source": "sensor-17"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .expect("message")
        .contains("value"));
}

#[tokio::test]
async fn timeseries_insert_rejects_numeric_string_value() {
    let (_state, app) = setup();

    let response = app
        .oneshot(authed_request(
            "POST",
            "/api/v1/timeseries",
            json!({
                "location": "London",
                "dataType": "temperature",
                "timestamp": "2024-06-01T12:00:00Z",
                "value": "42",
                "unit": "°C",
                "source": "sensor-17"
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn timeseries_query_requires_location_and_data_type() {
    let (_state, app) = setup();

    let response = app
        .oneshot(get_request("/api/v1/timeseries?dataType=temperature"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (_state, app) = setup();
    let response = app
        .oneshot(get_request("/api/v1/timeseries?location=London"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn timeseries_query_rejects_malformed_bucket_interval() {
    let (_state, app) = setup();

    let response = app
        .oneshot(get_request(
            "/api/v1/timeseries?location=London&dataType=temperature&bucket=1%20fortnight",
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn climate_list_rejects_malformed_start_date() {
    let (_state, app) = setup();

    let response = app
        .oneshot(get_request("/api/v1/climate?startDate=yesterday"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
