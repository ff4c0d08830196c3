/**
 * Message Listing Handler
 *
 * GET /api/chat/conversations/{id}/messages?page&limit
 *
 * Ownership and the active flag are checked before any message is read, so
 * soft-deleted conversations 404 here even though their rows remain in the
 * store. Messages come back in creation order.
 */

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use sqlx::SqlitePool;

use crate::chat::db;
use crate::chat::handlers::conversations::parse_conversation_id;
use crate::chat::handlers::types::{
    MessageListResponse, MessageResponse, PageQuery, Pagination,
};
use crate::error::{ApiError, Resource};
use crate::middleware::auth::AuthUser;

const DEFAULT_PAGE_LIMIT: i64 = 50;

/// List messages for a conversation
pub async fn list_messages(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let conversation = db::find_owned_active(&pool, conversation_id, user.id)
        .await
        .map_err(|e| ApiError::internal("FETCH_MESSAGES_ERROR", "Failed to fetch messages", e))?
        .ok_or(ApiError::not_found(Resource::Conversation))?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);

    let messages = db::messages_page(&pool, conversation.id, page, limit)
        .await
        .map_err(|e| ApiError::internal("FETCH_MESSAGES_ERROR", "Failed to fetch messages", e))?;
    let total = db::count_messages(&pool, conversation.id)
        .await
        .map_err(|e| ApiError::internal("FETCH_MESSAGES_ERROR", "Failed to fetch messages", e))?;

    Ok(Json(MessageListResponse {
        messages: messages.iter().map(MessageResponse::from).collect(),
        pagination: Pagination { page, limit, total },
    }))
}
