/**
 * Chat Handler Types
 *
 * Request and response types for the /api/chat endpoints.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::db::{Conversation, Message, MessageRole};

/// Public view of a conversation.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: i64,
    pub last_message_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationResponse {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.to_string(),
            title: conversation.title.clone(),
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
            message_count: conversation.message_count,
            last_message_at: conversation.last_message_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationResponse>,
}

#[derive(Deserialize, Debug)]
pub struct CreateConversationRequest {
    pub title: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ConversationEnvelope {
    pub message: &'static str,
    pub conversation: ConversationResponse,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConversationResponse {
    pub message: &'static str,
    pub conversation_id: String,
}

/// Page selector for message and notification listings.
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Generation metadata attached to a message.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub tokens: i64,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub processing_time: i64,
}

/// Public view of a message.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub content: String,
    pub role: MessageRole,
    pub created_at: DateTime<Utc>,
    pub is_edited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    pub metadata: MessageMetadata,
}

impl From<&Message> for MessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            content: message.content.clone(),
            role: message.role,
            created_at: message.created_at,
            is_edited: message.is_edited,
            edited_at: message.edited_at,
            metadata: MessageMetadata {
                tokens: message.tokens,
                model: message.model.clone(),
                temperature: message.temperature,
                processing_time: message.processing_time_ms,
            },
        }
    }
}

#[derive(Serialize, Debug)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Serialize, Debug)]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, Debug)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub message: &'static str,
    pub user_message: MessageResponse,
    pub ai_message: MessageResponse,
    /// Caller's balance after the debit
    pub credits: i64,
}
