/**
 * Notification Database Operations
 *
 * Per-user notices with a read flag. Purely pull-based: clients poll the
 * listing endpoint; nothing pushes deliveries.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{fmt_ts, parse_opt_ts, parse_ts, parse_uuid};

/// Category shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    Credit,
    System,
}

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Credit => "credit",
            Self::System => "system",
        }
    }

    fn parse(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "credit" => Ok(Self::Credit),
            "system" => Ok(Self::System),
            other => Err(sqlx::Error::Decode(
                format!("unknown notification kind: {other}").into(),
            )),
        }
    }
}

/// Emitting subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationSource {
    System,
    Chat,
    Billing,
    Security,
}

impl NotificationSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Chat => "chat",
            Self::Billing => "billing",
            Self::Security => "security",
        }
    }

    fn parse(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "system" => Ok(Self::System),
            "chat" => Ok(Self::Chat),
            "billing" => Ok(Self::Billing),
            "security" => Ok(Self::Security),
            other => Err(sqlx::Error::Decode(
                format!("unknown notification source: {other}").into(),
            )),
        }
    }
}

/// Display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

impl NotificationPriority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    fn parse(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(sqlx::Error::Decode(
                format!("unknown notification priority: {other}").into(),
            )),
        }
    }
}

/// A notification row.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub action_url: Option<String>,
    pub source: NotificationSource,
    pub priority: NotificationPriority,
    pub created_at: DateTime<Utc>,
}

/// Fields for a notification about to be created.
#[derive(Debug, Clone)]
pub struct NewNotification<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub message: &'a str,
    pub kind: NotificationKind,
    pub source: NotificationSource,
    pub priority: NotificationPriority,
    pub action_url: Option<&'a str>,
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: String,
    user_id: String,
    title: String,
    message: String,
    kind: String,
    is_read: bool,
    read_at: Option<String>,
    action_url: Option<String>,
    source: String,
    priority: String,
    created_at: String,
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification, sqlx::Error> {
        Ok(Notification {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            title: self.title,
            message: self.message,
            kind: NotificationKind::parse(&self.kind)?,
            is_read: self.is_read,
            read_at: parse_opt_ts(self.read_at.as_deref())?,
            action_url: self.action_url,
            source: NotificationSource::parse(&self.source)?,
            priority: NotificationPriority::parse(&self.priority)?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, kind, is_read, read_at, \
                                    action_url, source, priority, created_at";

/// Create a notification.
pub async fn create_notification(
    pool: &SqlitePool,
    new: NewNotification<'_>,
) -> Result<Notification, sqlx::Error> {
    let notification = Notification {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        title: new.title.to_string(),
        message: new.message.to_string(),
        kind: new.kind,
        is_read: false,
        read_at: None,
        action_url: new.action_url.map(str::to_string),
        source: new.source,
        priority: new.priority,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO notifications (id, user_id, title, message, kind, is_read, read_at,
                                   action_url, source, priority, created_at)
        VALUES (?, ?, ?, ?, ?, 0, NULL, ?, ?, ?, ?)
        "#,
    )
    .bind(notification.id.to_string())
    .bind(notification.user_id.to_string())
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.kind.as_str())
    .bind(&notification.action_url)
    .bind(notification.source.as_str())
    .bind(notification.priority.as_str())
    .bind(fmt_ts(notification.created_at))
    .execute(pool)
    .await?;

    Ok(notification)
}

/// One page of a user's notifications, newest first.
pub async fn list_page(
    pool: &SqlitePool,
    user_id: Uuid,
    page: i64,
    limit: i64,
    unread_only: bool,
) -> Result<Vec<Notification>, sqlx::Error> {
    let filter = if unread_only { "AND is_read = 0" } else { "" };
    let rows = sqlx::query_as::<_, NotificationRow>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
         WHERE user_id = ? {filter} \
         ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?"
    ))
    .bind(user_id.to_string())
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(NotificationRow::into_notification)
        .collect()
}

/// Count a user's notifications, optionally unread only.
pub async fn count_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    unread_only: bool,
) -> Result<i64, sqlx::Error> {
    let filter = if unread_only { "AND is_read = 0" } else { "" };
    let (count,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? {filter}"
    ))
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Mark one notification read, stamping `read_at`. Returns the updated row
/// or `None` when the caller owns no such notification.
pub async fn mark_read(
    pool: &SqlitePool,
    notification_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Notification>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = ? WHERE id = ? AND user_id = ?",
    )
    .bind(fmt_ts(Utc::now()))
    .bind(notification_id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    let row = sqlx::query_as::<_, NotificationRow>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
    ))
    .bind(notification_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(NotificationRow::into_notification).transpose()
}

/// Mark every unread notification of a user read.
pub async fn mark_all_read(pool: &SqlitePool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = 1, read_at = ? \
         WHERE user_id = ? AND is_read = 0",
    )
    .bind(fmt_ts(Utc::now()))
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete a notification the caller owns.
pub async fn delete_notification(
    pool: &SqlitePool,
    notification_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(notification_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
