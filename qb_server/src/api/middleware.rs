//! Authentication middleware for protected endpoints.
//!
//! Extracts and validates the JWT access token from the `Authorization`
//! header, then injects the authenticated user id into request extensions
//! for downstream handlers:
//!
//! ```rust,ignore
//! async fn handler(Extension(user_id): Extension<i64>) { /* ... */ }
//! ```

use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use super::AppState;

/// Validate the bearer token and inject the caller's user id.
///
/// - **Success**: token valid → `user_id: i64` lands in request extensions
/// - **Missing header / invalid format / bad token**: `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let token = match auth_header {
        Some(t) => t,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match state.auth_manager.verify_access_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims.sub);
            Ok(next.run(request).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}
