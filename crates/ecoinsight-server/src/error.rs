use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type. Cache
/// failures never become an `AppError` — they degrade to store reads
/// inside the cache layer itself.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed, missing or unknown fields in the request.
    #[error("validation: {0}")]
    Validation(String),

    /// Missing, invalid or expired credentials.
    #[error("unauthorized: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate unique field.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited")]
    RateLimited,

    /// An external API misbehaved — distinguished from our own bugs (500).
    /// `status` carries the upstream HTTP status when one was received.
    #[error("upstream service failure")]
    Upstream { status: Option<u16> },

    /// A backing dependency is unreachable or unconfigured.
    #[error("dependency unavailable: {0}")]
    Dependency(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later".to_string(),
            ),
            AppError::Upstream { status } => {
                let body = Json(json!({
                    "success": false,
                    "error": {
                        "message": "Upstream service unavailable",
                        "upstreamStatus": status,
                    }
                }));
                return (StatusCode::SERVICE_UNAVAILABLE, body).into_response();
            }
            AppError::Dependency(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": { "message": message }
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn variants_map_to_expected_status() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Auth("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                AppError::Upstream { status: Some(404) },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Dependency("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    async fn body_of(response: Response) -> serde_json::Value {
        use http_body_util::BodyExt;
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn upstream_status_is_annotated_in_the_body() {
        let body = body_of(AppError::Upstream { status: Some(404) }.into_response()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Upstream service unavailable");
        assert_eq!(body["error"]["upstreamStatus"], 404);
    }

    #[tokio::test]
    async fn upstream_without_status_annotates_null() {
        let body = body_of(AppError::Upstream { status: None }.into_response()).await;
        assert!(body["error"]["upstreamStatus"].is_null());
    }
}
