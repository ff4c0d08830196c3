/**
 * Profile and Stats Handlers
 *
 * - `GET /api/user/profile` - fresh view of the caller's record
 * - `PUT /api/user/profile` - username and preference updates
 * - `GET /api/user/stats`   - aggregate counts for the dashboard
 */

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::auth::handlers::types::{UserEnvelope, UserResponse};
use crate::auth::users::{self, Preferences};
use crate::chat::db::{count_active_conversations, count_messages_for_user};
use crate::error::{ApiError, Resource};
use crate::middleware::auth::AuthUser;
use crate::notifications::db::count_for_user;
use crate::validation::{validate_theme, validate_username};

/// Partial preference update; absent fields keep their stored values.
#[derive(Deserialize, Debug, Default)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub notifications: Option<NotificationsPatch>,
}

#[derive(Deserialize, Debug, Default)]
pub struct NotificationsPatch {
    #[serde(default)]
    pub email: Option<bool>,
    #[serde(default)]
    pub push: Option<bool>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub preferences: Option<PreferencesPatch>,
}

#[derive(Serialize, Debug)]
pub struct ProfileUpdateResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatsBody {
    pub conversations: i64,
    pub messages: i64,
    pub unread_notifications: i64,
    pub credits: i64,
    pub plan: String,
}

#[derive(Serialize, Debug)]
pub struct StatsResponse {
    pub stats: StatsBody,
}

/// Get user profile (GET /api/user/profile)
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> Result<Json<UserEnvelope>, ApiError> {
    // Re-read rather than echoing the middleware's copy; credits may have
    // moved since the token check.
    let user = users::get_user_by_id(&pool, user.id)
        .await
        .map_err(|e| ApiError::internal("FETCH_PROFILE_ERROR", "Failed to fetch profile", e))?
        .ok_or(ApiError::not_found(Resource::User))?;

    Ok(Json(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// Update user profile (PUT /api/user/profile)
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileUpdateResponse>, ApiError> {
    let new_username = request.username.as_deref().map(str::trim);

    let mut errors = Vec::new();
    if let Some(username) = new_username {
        errors.extend(validate_username(username));
    }
    if let Some(theme) = request
        .preferences
        .as_ref()
        .and_then(|patch| patch.theme.as_deref())
    {
        errors.extend(validate_theme(theme));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(username) = new_username {
        let taken = users::username_taken_by_other(&pool, username, user.id)
            .await
            .map_err(|e| {
                ApiError::internal("UPDATE_PROFILE_ERROR", "Failed to update profile", e)
            })?;
        if taken {
            return Err(ApiError::UsernameTaken);
        }
    }

    let username = new_username.unwrap_or(&user.username);
    let preferences = merge_preferences(&user.preferences, request.preferences.as_ref());

    let updated = users::update_profile(&pool, user.id, username, &preferences)
        .await
        .map_err(|e| ApiError::internal("UPDATE_PROFILE_ERROR", "Failed to update profile", e))?
        .ok_or(ApiError::not_found(Resource::User))?;

    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully",
        user: UserResponse::from(&updated),
    }))
}

fn merge_preferences(current: &Preferences, patch: Option<&PreferencesPatch>) -> Preferences {
    let mut merged = current.clone();
    if let Some(patch) = patch {
        if let Some(theme) = &patch.theme {
            merged.theme = theme.clone();
        }
        if let Some(notifications) = &patch.notifications {
            if let Some(email) = notifications.email {
                merged.notifications.email = email;
            }
            if let Some(push) = notifications.push {
                merged.notifications.push = push;
            }
        }
    }
    merged
}

/// Get user stats (GET /api/user/stats)
pub async fn get_stats(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let map_err = |e| ApiError::internal("FETCH_STATS_ERROR", "Failed to fetch stats", e);

    let conversations = count_active_conversations(&pool, user.id)
        .await
        .map_err(map_err)?;
    let messages = count_messages_for_user(&pool, user.id).await.map_err(map_err)?;
    let unread_notifications = count_for_user(&pool, user.id, true).await.map_err(map_err)?;

    Ok(Json(StatsResponse {
        stats: StatsBody {
            conversations,
            messages,
            unread_notifications,
            credits: user.credits,
            plan: user.plan,
        },
    }))
}
