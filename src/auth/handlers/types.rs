/**
 * Authentication Handler Types
 *
 * Request and response types shared by the auth handlers. `UserResponse`
 * is the public view of a user record and is reused by the profile
 * endpoints; it never carries the password hash.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::users::{Preferences, User};

/// Registration request
#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh request
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// User information safe to return to clients.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub credits: i64,
    pub plan: String,
    pub preferences: Preferences,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            credits: user.credits,
            plan: user.plan.clone(),
            preferences: user.preferences.clone(),
            last_login: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Returned by register and login: the user plus a fresh token pair.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: &'static str,
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Returned by the refresh exchange.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub message: &'static str,
    pub token: String,
    pub refresh_token: String,
}

/// Returned by `GET /api/auth/me` and the profile endpoints.
#[derive(Serialize, Debug)]
pub struct UserEnvelope {
    pub user: UserResponse,
}
