/**
 * Authentication Middleware
 *
 * This middleware protects the chat, user, and realtime routes. It
 * extracts the bearer token from the Authorization header, verifies it,
 * resolves it to a live user record, and attaches that record to the
 * request extensions for downstream handlers.
 *
 * Failure mapping:
 * - missing header          -> 401 NO_TOKEN
 * - bad scheme / signature  -> 401 INVALID_TOKEN
 * - expired token           -> 401 TOKEN_EXPIRED
 * - missing / inactive user -> 401 INVALID_USER
 * - store failure           -> 500 AUTH_ERROR
 */

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::tokens::{verify_token, TokenError};
use crate::auth::users::{get_user_by_id, User};
use crate::error::{ApiError, AuthFailure};
use crate::server::state::AppState;

/// Authenticated user attached to the request by [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Authentication middleware for protected routes.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(AuthFailure::NoToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthFailure::InvalidToken)?;

    let claims = verify_token(token, &state.config.jwt_secret).map_err(|e| match e {
        TokenError::Expired => AuthFailure::Expired,
        TokenError::Malformed(detail) => {
            tracing::warn!("Rejected token: {}", detail);
            AuthFailure::InvalidToken
        }
    })?;

    let user_id = claims.user_id().map_err(|_| AuthFailure::InvalidToken)?;

    let user = get_user_by_id(&state.pool, user_id)
        .await
        .map_err(|e| ApiError::internal("AUTH_ERROR", "Authentication error", e))?;

    let user = user
        .filter(|user| user.is_active)
        .ok_or(AuthFailure::InvalidUser)?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated user.
///
/// Handlers on routes behind [`auth_middleware`] take `AuthUser(user)` as
/// a parameter to receive the resolved user record.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(|current| AuthUser(current.0))
            .ok_or(ApiError::Auth(AuthFailure::NoToken))
    }
}
