/**
 * Current User Handler
 *
 * GET /api/auth/me
 *
 * Sits behind the auth middleware, which has already verified the token
 * and loaded a fresh, active user record. The handler only shapes the
 * response.
 */

use axum::response::Json;

use crate::auth::handlers::types::{UserEnvelope, UserResponse};
use crate::middleware::auth::AuthUser;

/// Current user handler
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserEnvelope> {
    Json(UserEnvelope {
        user: UserResponse::from(&user),
    })
}
