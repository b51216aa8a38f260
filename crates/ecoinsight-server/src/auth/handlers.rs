use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use tracing::info;

use ecoinsight_pg::users::is_unique_violation;

use crate::error::AppError;
use crate::routes::body::{as_object, require_str};
use crate::state::AppState;

use super::jwt::encode_jwt;
use super::password::{hash_password, verify_password};

/// POST /api/v1/auth/register
///
/// Duplicate username or email is a 409. The duplicate check is a
/// lookup rather than relying on the unique index so the client gets a
/// clean conflict message instead of a masked database error. Two
/// concurrent registrations can both pass the lookup; the loser's
/// unique-index violation is still mapped to the same 409.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let obj = as_object(&payload)?;
    let username = require_str(obj, "username")?;
    let email = require_str(obj, "email")?;
    let password = require_str(obj, "password")?;

    if state.docs.user_exists(username, email).await? {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(password)?;
    let user = match state.docs.create_user(username, email, &password_hash).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "id": user.id,
                "username": user.username,
                "email": user.email,
            }
        })),
    ))
}

/// POST /api/v1/auth/login
///
/// Unknown email and bad password produce the same 401 message, so the
/// response does not reveal which accounts exist.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let obj = as_object(&payload)?;
    let email = require_str(obj, "email")?;
    let password = require_str(obj, "password")?;

    let user = state
        .docs
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid credentials".to_string()))?;

    if !verify_password(password, &user.password_hash) {
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    let token = encode_jwt(&state.config.jwt_secret, user.id, &user.role)?;
    info!(user_id = %user.id, "user logged in");

    Ok(Json(json!({
        "success": true,
        "data": { "token": token }
    })))
}
