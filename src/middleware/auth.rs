use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth;
use crate::error::ApiError;

/// Authenticated user context extracted from a validated JWT.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i32,
}

/// JWT authentication middleware guarding the mutating routes. Validates the
/// Bearer token and injects [`AuthUser`] into request extensions.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = auth::validate_jwt(&token).map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let user_id = claims
        .sub
        .parse::<i32>()
        .map_err(|_| ApiError::unauthorized("Invalid token subject"))?;

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

/// Extract the JWT from the Authorization header.
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Authorization header required".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header format must be Bearer {token}".to_string())
    }
}
