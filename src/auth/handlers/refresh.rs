/**
 * Refresh Handler
 *
 * POST /api/auth/refresh
 *
 * Exchanges a refresh token for a new access/refresh pair. The presented
 * token must verify and carry the refresh type marker; an access token is
 * rejected here even though it is signed with the same secret. The prior
 * pair is not invalidated - there is no rotation tracking.
 */

use axum::{extract::State, response::Json};

use crate::auth::handlers::types::{RefreshRequest, TokenPairResponse};
use crate::auth::tokens::{issue_access_token, issue_refresh_token, verify_token};
use crate::auth::users::get_user_by_id;
use crate::error::{ApiError, AuthFailure};
use crate::server::state::AppState;

/// Refresh handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let token = request
        .refresh_token
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingRefreshToken)?;

    let claims =
        verify_token(&token, &state.config.jwt_secret).map_err(|_| ApiError::InvalidRefreshToken)?;

    if !claims.is_refresh() {
        tracing::warn!("Access token presented at the refresh endpoint");
        return Err(ApiError::InvalidRefreshToken);
    }

    let user_id = claims.user_id().map_err(|_| ApiError::InvalidRefreshToken)?;

    let user = get_user_by_id(&state.pool, user_id)
        .await
        .map_err(|e| ApiError::internal("INTERNAL_ERROR", "Token refresh failed", e))?
        .filter(|user| user.is_active)
        .ok_or(ApiError::Auth(AuthFailure::InvalidUser))?;

    let token = issue_access_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::internal("INTERNAL_ERROR", "Token refresh failed", e))?;
    let refresh_token = issue_refresh_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::internal("INTERNAL_ERROR", "Token refresh failed", e))?;

    Ok(Json(TokenPairResponse {
        message: "Token refreshed successfully",
        token,
        refresh_token,
    }))
}
