use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header, http::request::Parts};

use crate::{error::AppError, state::AppState};

use super::jwt::{decode_jwt, Claims};

/// Extractor that requires a valid `Authorization: Bearer <token>` header.
///
/// Mutation handlers take an `AuthUser` argument; public reads simply
/// omit it. Missing, malformed or expired tokens reject with 401 before
/// the handler body runs.
#[derive(Debug)]
pub struct AuthUser {
    pub claims: Claims,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Auth("Unauthorized".to_string()))?;

        let claims = decode_jwt(token, &state.config.jwt_secret)
            .map_err(|_| AppError::Auth("Invalid token".to_string()))?;

        Ok(AuthUser { claims })
    }
}
