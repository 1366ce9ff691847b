use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::error::ApiError;
use crate::models::{Credentials, User};
use crate::repository::UserRepository;
use crate::state::AppState;

/// POST /register - create an application account.
pub async fn register(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if creds.email.is_empty() || creds.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let users = UserRepository::new(state.pool.clone());
    if users.find_by_email(&creds.email).await?.is_some() {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let password_hash = auth::hash_password(&creds.password).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to register user")
    })?;
    let user = users.create(&creds.email, &password_hash).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /login - verify credentials and issue a JWT.
pub async fn login(
    State(state): State<AppState>,
    Json(creds): Json<Credentials>,
) -> Result<Json<Value>, ApiError> {
    if creds.email.is_empty() || creds.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let users = UserRepository::new(state.pool.clone());
    let user = users
        .find_by_email(&creds.email)
        .await?
        // Same message for unknown user and bad password.
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !auth::verify_password(&creds.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let token = auth::generate_jwt(Claims::new(user.id)).map_err(|e| {
        tracing::error!("Token generation failed: {}", e);
        ApiError::internal_server_error("Error generating token")
    })?;

    Ok(Json(json!({ "token": token })))
}
