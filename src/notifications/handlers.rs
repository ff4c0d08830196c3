/**
 * Notification Handlers
 *
 * - `GET    /api/user/notifications` - paginated listing, optional unread
 *   filter, unread count in the pagination block
 * - `PUT    /api/user/notifications/{id}/read` - mark one read
 * - `PUT    /api/user/notifications/read-all`  - mark everything read
 * - `DELETE /api/user/notifications/{id}`      - delete
 */

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{ApiError, Resource};
use crate::middleware::auth::AuthUser;
use crate::notifications::db::{
    self, Notification, NotificationKind, NotificationPriority, NotificationSource,
};

const DEFAULT_PAGE_LIMIT: i64 = 20;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMetadata {
    pub source: NotificationSource,
    pub priority: NotificationPriority,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    pub metadata: NotificationMetadata,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.to_string(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            kind: notification.kind,
            is_read: notification.is_read,
            read_at: notification.read_at,
            action_url: notification.action_url.clone(),
            metadata: NotificationMetadata {
                source: notification.source,
                priority: notification.priority,
            },
            created_at: notification.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub unread_count: i64,
}

#[derive(Serialize, Debug)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: NotificationPagination,
}

#[derive(Serialize, Debug)]
pub struct NotificationEnvelope {
    pub message: &'static str,
    pub notification: NotificationResponse,
}

#[derive(Serialize, Debug)]
pub struct MessageOnlyResponse {
    pub message: &'static str,
}

fn parse_notification_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(Resource::Notification))
}

/// List notifications (GET /api/user/notifications)
pub async fn list_notifications(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let map_err =
        |e| ApiError::internal("FETCH_NOTIFICATIONS_ERROR", "Failed to fetch notifications", e);

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
    let unread_only = query.unread_only.unwrap_or(false);

    let notifications = db::list_page(&pool, user.id, page, limit, unread_only)
        .await
        .map_err(map_err)?;
    let total = db::count_for_user(&pool, user.id, unread_only)
        .await
        .map_err(map_err)?;
    let unread_count = db::count_for_user(&pool, user.id, true).await.map_err(map_err)?;

    Ok(Json(NotificationListResponse {
        notifications: notifications.iter().map(NotificationResponse::from).collect(),
        pagination: NotificationPagination {
            page,
            limit,
            total,
            unread_count,
        },
    }))
}

/// Mark one notification read (PUT /api/user/notifications/{id}/read)
pub async fn mark_notification_read(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<NotificationEnvelope>, ApiError> {
    let notification_id = parse_notification_id(&notification_id)?;

    let notification = db::mark_read(&pool, notification_id, user.id)
        .await
        .map_err(|e| {
            ApiError::internal(
                "MARK_NOTIFICATION_READ_ERROR",
                "Failed to mark notification as read",
                e,
            )
        })?
        .ok_or(ApiError::not_found(Resource::Notification))?;

    Ok(Json(NotificationEnvelope {
        message: "Notification marked as read",
        notification: NotificationResponse::from(&notification),
    }))
}

/// Mark all notifications read (PUT /api/user/notifications/read-all)
pub async fn mark_all_notifications_read(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageOnlyResponse>, ApiError> {
    let updated = db::mark_all_read(&pool, user.id).await.map_err(|e| {
        ApiError::internal(
            "MARK_ALL_NOTIFICATIONS_READ_ERROR",
            "Failed to mark all notifications as read",
            e,
        )
    })?;

    tracing::debug!("Marked {} notifications read for user {}", updated, user.id);

    Ok(Json(MessageOnlyResponse {
        message: "All notifications marked as read",
    }))
}

/// Delete a notification (DELETE /api/user/notifications/{id})
pub async fn delete_notification(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<String>,
) -> Result<Json<MessageOnlyResponse>, ApiError> {
    let notification_id = parse_notification_id(&notification_id)?;

    let deleted = db::delete_notification(&pool, notification_id, user.id)
        .await
        .map_err(|e| {
            ApiError::internal("DELETE_NOTIFICATION_ERROR", "Failed to delete notification", e)
        })?;

    if !deleted {
        return Err(ApiError::not_found(Resource::Notification));
    }

    Ok(Json(MessageOnlyResponse {
        message: "Notification deleted successfully",
    }))
}
