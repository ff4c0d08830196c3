/**
 * Registration Handler
 *
 * POST /api/auth/register
 *
 * 1. Validate username and password
 * 2. Reject taken usernames with 409
 * 3. Hash the password with bcrypt and create the user with the default
 *    credit grant
 * 4. Drop a welcome notification (best effort)
 * 5. Stamp last login and return the token pair
 */

use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::{hash, DEFAULT_COST};

use crate::auth::handlers::types::{AuthResponse, RegisterRequest, UserResponse};
use crate::auth::tokens::{issue_access_token, issue_refresh_token};
use crate::auth::users::{create_user, get_user_by_username, touch_last_login};
use crate::error::ApiError;
use crate::notifications::db::{
    create_notification, NewNotification, NotificationKind, NotificationPriority,
    NotificationSource,
};
use crate::realtime::broadcast::{broadcast_event, RealtimeEvent};
use crate::server::state::AppState;
use crate::validation::{validate_password, validate_username};

const ERR_CODE: &str = "REGISTRATION_ERROR";
const ERR_MESSAGE: &str = "Registration failed";

/// Registration handler
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let username = request.username.trim();
    tracing::info!("Registration request for: {}", username);

    let mut errors = Vec::new();
    errors.extend(validate_username(username));
    errors.extend(validate_password(&request.password));
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let existing = get_user_by_username(&state.pool, username)
        .await
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;
    if existing.is_some() {
        tracing::warn!("Username already taken: {}", username);
        return Err(ApiError::UserExists);
    }

    let password_hash = hash(&request.password, DEFAULT_COST)
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;

    let mut user = create_user(&state.pool, username, &password_hash)
        .await
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;

    // Welcome notice; registration succeeds even if this write fails
    let welcome = create_notification(
        &state.pool,
        NewNotification {
            user_id: user.id,
            title: "Welcome to corechat",
            message: "Your account is ready. Every new account starts with 100 credits.",
            kind: NotificationKind::Info,
            source: NotificationSource::System,
            priority: NotificationPriority::Low,
            action_url: None,
        },
    )
    .await;
    match welcome {
        Ok(notification) => {
            broadcast_event(
                &state.events,
                RealtimeEvent::notification(
                    user.id,
                    serde_json::json!({
                        "id": notification.id.to_string(),
                        "title": notification.title,
                    }),
                ),
            );
        }
        Err(e) => tracing::warn!("Failed to create welcome notification: {}", e),
    }

    let last_login = touch_last_login(&state.pool, user.id)
        .await
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;
    user.last_login_at = Some(last_login);

    let token = issue_access_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;
    let refresh_token = issue_refresh_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::internal(ERR_CODE, ERR_MESSAGE, e))?;

    tracing::info!("User registered: {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            user: UserResponse::from(&user),
            token,
            refresh_token,
        }),
    ))
}
