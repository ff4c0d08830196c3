/**
 * User Model and Database Operations
 *
 * This module holds the user record type and every query that touches the
 * `users` table, including the conditional credit debit used by the
 * send-message path.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{fmt_ts, parse_opt_ts, parse_ts, parse_uuid};

/// Credits granted to every new account.
pub const DEFAULT_CREDIT_GRANT: i64 = 100;
/// Plan assigned to every new account.
pub const DEFAULT_PLAN: &str = "free";

/// Per-channel notification switches inside [`Preferences`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    #[serde(default = "default_true")]
    pub email: bool,
    #[serde(default = "default_true")]
    pub push: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
        }
    }
}

/// User preferences, persisted as a JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// UI theme: "light" or "dark"
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub notifications: NotificationPrefs,
}

fn default_theme() -> String {
    "light".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            notifications: NotificationPrefs::default(),
        }
    }
}

/// User struct representing a user in the database
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID (UUID)
    pub id: Uuid,
    /// Username (unique, 3-30 chars, alphanumeric + underscore)
    pub username: String,
    /// Hashed password (bcrypt)
    pub password_hash: String,
    /// Remaining chat credits; one is debited per sent message
    pub credits: i64,
    /// Billing plan (free, pro, enterprise)
    pub plan: String,
    /// User preferences
    pub preferences: Preferences,
    /// Deactivated accounts keep their rows but cannot authenticate
    pub is_active: bool,
    /// Last login timestamp
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    credits: i64,
    plan: String,
    preferences: String,
    is_active: bool,
    last_login_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn into_user(self) -> Result<User, sqlx::Error> {
        let preferences: Preferences = serde_json::from_str(&self.preferences)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(User {
            id: parse_uuid(&self.id)?,
            username: self.username,
            password_hash: self.password_hash,
            credits: self.credits,
            plan: self.plan,
            preferences,
            is_active: self.is_active,
            last_login_at: parse_opt_ts(self.last_login_at.as_deref())?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, credits, plan, preferences, \
                            is_active, last_login_at, created_at, updated_at";

/// Create a new user with the default credit grant, plan, and preferences.
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        password_hash: password_hash.to_string(),
        credits: DEFAULT_CREDIT_GRANT,
        plan: DEFAULT_PLAN.to_string(),
        preferences: Preferences::default(),
        is_active: true,
        last_login_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let preferences = serde_json::to_string(&user.preferences)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query(
        r#"
        INSERT INTO users (id, username, password_hash, credits, plan, preferences,
                           is_active, last_login_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.credits)
    .bind(&user.plan)
    .bind(&preferences)
    .bind(user.is_active)
    .bind(fmt_ts(user.created_at))
    .bind(fmt_ts(user.updated_at))
    .execute(pool)
    .await?;

    Ok(user)
}

/// Get user by username
pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_user).transpose()
}

/// Get user by ID
pub async fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(UserRow::into_user).transpose()
}

/// Check whether a username is held by any user other than `user_id`.
pub async fn username_taken_by_other(
    pool: &SqlitePool,
    username: &str,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ? AND id != ?")
            .bind(username)
            .bind(user_id.to_string())
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Stamp the user's last login.
pub async fn touch_last_login(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<DateTime<Utc>, sqlx::Error> {
    let now = Utc::now();
    sqlx::query("UPDATE users SET last_login_at = ?, updated_at = ? WHERE id = ?")
        .bind(fmt_ts(now))
        .bind(fmt_ts(now))
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(now)
}

/// Replace the user's username and preferences.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: Uuid,
    username: &str,
    preferences: &Preferences,
) -> Result<Option<User>, sqlx::Error> {
    let preferences =
        serde_json::to_string(preferences).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    sqlx::query("UPDATE users SET username = ?, preferences = ?, updated_at = ? WHERE id = ?")
        .bind(username)
        .bind(&preferences)
        .bind(fmt_ts(Utc::now()))
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    get_user_by_id(pool, user_id).await
}

/// Debit one credit if the balance allows it.
///
/// The balance check and the decrement are one UPDATE, so two concurrent
/// sends against a balance of 1 cannot both succeed: the losing request
/// sees zero rows affected and gets `false`.
pub async fn debit_credit(pool: &SqlitePool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET credits = credits - 1, updated_at = ? \
         WHERE id = ? AND credits >= 1",
    )
    .bind(fmt_ts(Utc::now()))
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Return one credit, undoing a debit whose send failed downstream.
pub async fn refund_credit(pool: &SqlitePool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET credits = credits + 1, updated_at = ? WHERE id = ?")
        .bind(fmt_ts(Utc::now()))
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Flip the active flag. No route exposes this; operators flip it directly
/// and the auth middleware starts rejecting the account on its next request.
pub async fn set_active(
    pool: &SqlitePool,
    user_id: Uuid,
    is_active: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(is_active)
        .bind(fmt_ts(Utc::now()))
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
