/**
 * Login Handler
 *
 * POST /api/auth/login
 *
 * # Security
 *
 * Unknown usernames and wrong passwords produce the same response body so
 * the endpoint cannot be used to enumerate accounts. bcrypt's comparison
 * is constant-time per hash; request timing is not otherwise equalized.
 */

use axum::{extract::State, response::Json};
use bcrypt::verify;

use crate::auth::handlers::types::{AuthResponse, LoginRequest, UserResponse};
use crate::auth::tokens::{issue_access_token, issue_refresh_token};
use crate::auth::users::{get_user_by_username, touch_last_login};
use crate::error::ApiError;
use crate::server::state::AppState;

const ERR_CODE: &str = "LOGIN_ERROR";
const ERR_MESSAGE: &str = "Login failed";

/// Login handler
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    tracing::info!("Login request for: {}", request.username);

    let mut user = get_user_by_username(&state.pool, request.username.trim())
        .await
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?
        .ok_or(ApiError::InvalidCredentials)?;

    if !user.is_active {
        tracing::warn!("Login attempt on deactivated account: {}", user.username);
        return Err(ApiError::AccountDeactivated);
    }

    let valid = verify(&request.password, &user.password_hash)
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;
    if !valid {
        tracing::warn!("Invalid password for user: {}", user.username);
        return Err(ApiError::InvalidCredentials);
    }

    let last_login = touch_last_login(&state.pool, user.id)
        .await
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;
    user.last_login_at = Some(last_login);

    let token = issue_access_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;
    let refresh_token = issue_refresh_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;

    tracing::info!("User logged in: {}", user.username);

    Ok(Json(AuthResponse {
        message: "Login successful",
        user: UserResponse::from(&user),
        token,
        refresh_token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::users::{create_user, set_active};
    use crate::db::test_util::memory_pool;
    use bcrypt::{hash, DEFAULT_COST};

    async fn seed_user(state: &AppState, username: &str, password: &str) -> uuid::Uuid {
        let password_hash = hash(password, DEFAULT_COST).unwrap();
        create_user(&state.pool, username, &password_hash)
            .await
            .unwrap()
            .id
    }

    fn request(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn test_login_success_stamps_last_login() {
        let state = AppState::for_tests(memory_pool().await);
        seed_user(&state, "alice", "password123").await;

        let response = login(State(state.clone()), request("alice", "password123"))
            .await
            .unwrap();
        assert_eq!(response.user.username, "alice");
        assert!(response.user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_identical() {
        let state = AppState::for_tests(memory_pool().await);
        seed_user(&state, "alice", "password123").await;

        let wrong_password = login(State(state.clone()), request("alice", "nope-nope-nope"))
            .await
            .unwrap_err();
        let unknown_user = login(State(state.clone()), request("mallory", "password123"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.code(), unknown_user.code());
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_deactivated_account() {
        let state = AppState::for_tests(memory_pool().await);
        let user_id = seed_user(&state, "alice", "password123").await;
        set_active(&state.pool, user_id, false).await.unwrap();

        let result = login(State(state.clone()), request("alice", "password123")).await;
        assert!(matches!(result, Err(ApiError::AccountDeactivated)));
    }
}
