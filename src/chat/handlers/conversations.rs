/**
 * Conversation Handlers
 *
 * CRUD over the caller's conversations. Every operation is scoped to the
 * authenticated owner; a conversation belonging to someone else is
 * indistinguishable from one that does not exist.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::chat::db;
use crate::chat::handlers::types::{
    ConversationEnvelope, ConversationListResponse, ConversationResponse,
    CreateConversationRequest, DeleteConversationResponse, UpdateConversationRequest,
};
use crate::error::{ApiError, Resource};
use crate::middleware::auth::AuthUser;
use crate::validation::validate_title;

/// Path ids arrive as strings; anything that does not parse as a UUID
/// cannot name an existing conversation.
pub(crate) fn parse_conversation_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(Resource::Conversation))
}

/// List conversations (GET /api/chat/conversations)
pub async fn list_conversations(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
) -> Result<Json<ConversationListResponse>, ApiError> {
    let conversations = db::list_for_user(&pool, user.id).await.map_err(|e| {
        ApiError::internal("FETCH_CONVERSATIONS_ERROR", "Failed to fetch conversations", e)
    })?;

    Ok(Json(ConversationListResponse {
        conversations: conversations.iter().map(ConversationResponse::from).collect(),
    }))
}

/// Create conversation (POST /api/chat/conversations)
pub async fn create_conversation(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationEnvelope>), ApiError> {
    let title = request.title.trim();
    if let Some(error) = validate_title(title) {
        return Err(ApiError::Validation(vec![error]));
    }

    let conversation = db::create_conversation(&pool, user.id, title)
        .await
        .map_err(|e| {
            ApiError::internal("CREATE_CONVERSATION_ERROR", "Failed to create conversation", e)
        })?;

    tracing::info!("Conversation {} created for user {}", conversation.id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ConversationEnvelope {
            message: "Conversation created successfully",
            conversation: ConversationResponse::from(&conversation),
        }),
    ))
}

/// Rename conversation (PUT /api/chat/conversations/{id})
pub async fn update_conversation(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<String>,
    Json(request): Json<UpdateConversationRequest>,
) -> Result<Json<ConversationEnvelope>, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let title = request.title.as_deref().unwrap_or("").trim().to_string();
    if title.is_empty() {
        return Err(ApiError::InvalidTitle);
    }
    if let Some(error) = validate_title(&title) {
        return Err(ApiError::Validation(vec![error]));
    }

    let conversation = db::rename_conversation(&pool, conversation_id, user.id, &title)
        .await
        .map_err(|e| {
            ApiError::internal("UPDATE_CONVERSATION_ERROR", "Failed to update conversation", e)
        })?
        .ok_or(ApiError::not_found(Resource::Conversation))?;

    Ok(Json(ConversationEnvelope {
        message: "Conversation updated successfully",
        conversation: ConversationResponse::from(&conversation),
    }))
}

/// Soft-delete conversation (DELETE /api/chat/conversations/{id})
pub async fn delete_conversation(
    State(pool): State<SqlitePool>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<DeleteConversationResponse>, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let deleted = db::soft_delete_conversation(&pool, conversation_id, user.id)
        .await
        .map_err(|e| {
            ApiError::internal("DELETE_CONVERSATION_ERROR", "Failed to delete conversation", e)
        })?;

    if !deleted {
        return Err(ApiError::not_found(Resource::Conversation));
    }

    tracing::info!("Conversation {} soft-deleted by user {}", conversation_id, user.id);

    Ok(Json(DeleteConversationResponse {
        message: "Conversation deleted successfully",
        conversation_id: conversation_id.to_string(),
    }))
}
