/**
 * Conversation and Message Database Operations
 *
 * This module holds the row types and every query touching the
 * `conversations` and `messages` tables. The send-message path uses the
 * turn-recording operations at the bottom: a turn insert is followed by
 * its counter bump in the documented write order, and `rollback_user_turn`
 * undoes exactly that pair when response generation fails afterwards.
 * Statements are individually atomic; no operation spans them with a
 * transaction.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::ai::{GeneratedReply, GenerationSettings};
use crate::db::{fmt_ts, parse_opt_ts, parse_ts, parse_uuid};

/// Listing endpoint returns at most this many conversations.
pub const CONVERSATION_LIST_LIMIT: i64 = 50;

/// Default generation model for new conversations.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Default sampling temperature for new conversations.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Default reply token cap for new conversations.
pub const DEFAULT_MAX_TOKENS: i64 = 1000;

/// Author of a message turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    fn parse(value: &str) -> Result<Self, sqlx::Error> {
        match value {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            other => Err(sqlx::Error::Decode(
                format!("unknown message role: {other}").into(),
            )),
        }
    }
}

/// A conversation row, including its generation settings and aggregate
/// counters.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    /// Soft-deleted conversations keep their rows and messages
    pub is_active: bool,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i64,
    /// Total turns recorded (user + assistant)
    pub message_count: i64,
    /// Sum of assistant-turn token counts
    pub total_tokens: i64,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Generation settings handed to the response generator.
    pub fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ConversationRow {
    id: String,
    user_id: String,
    title: String,
    is_active: bool,
    model: String,
    temperature: f64,
    max_tokens: i64,
    message_count: i64,
    total_tokens: i64,
    last_message_at: String,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn into_conversation(self) -> Result<Conversation, sqlx::Error> {
        Ok(Conversation {
            id: parse_uuid(&self.id)?,
            user_id: parse_uuid(&self.user_id)?,
            title: self.title,
            is_active: self.is_active,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            message_count: self.message_count,
            total_tokens: self.total_tokens,
            last_message_at: parse_ts(&self.last_message_at)?,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

const CONVERSATION_COLUMNS: &str = "id, user_id, title, is_active, model, temperature, \
                                    max_tokens, message_count, total_tokens, \
                                    last_message_at, created_at, updated_at";

/// A single chat turn.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub role: MessageRole,
    pub tokens: i64,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub processing_time_ms: i64,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    conversation_id: String,
    user_id: String,
    content: String,
    role: String,
    tokens: i64,
    model: Option<String>,
    temperature: Option<f64>,
    processing_time_ms: i64,
    is_edited: bool,
    edited_at: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn into_message(self) -> Result<Message, sqlx::Error> {
        Ok(Message {
            id: parse_uuid(&self.id)?,
            conversation_id: parse_uuid(&self.conversation_id)?,
            user_id: parse_uuid(&self.user_id)?,
            content: self.content,
            role: MessageRole::parse(&self.role)?,
            tokens: self.tokens,
            model: self.model,
            temperature: self.temperature,
            processing_time_ms: self.processing_time_ms,
            is_edited: self.is_edited,
            edited_at: parse_opt_ts(self.edited_at.as_deref())?,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

const MESSAGE_COLUMNS: &str = "id, conversation_id, user_id, content, role, tokens, model, \
                               temperature, processing_time_ms, is_edited, edited_at, created_at";

/// List the caller's active conversations, most recently updated first.
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<Conversation>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ConversationRow>(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations \
         WHERE user_id = ? AND is_active = 1 \
         ORDER BY updated_at DESC LIMIT ?"
    ))
    .bind(user_id.to_string())
    .bind(CONVERSATION_LIST_LIMIT)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(ConversationRow::into_conversation)
        .collect()
}

/// Create a conversation with default generation settings.
pub async fn create_conversation(
    pool: &SqlitePool,
    user_id: Uuid,
    title: &str,
) -> Result<Conversation, sqlx::Error> {
    let now = Utc::now();
    let conversation = Conversation {
        id: Uuid::new_v4(),
        user_id,
        title: title.to_string(),
        is_active: true,
        model: DEFAULT_MODEL.to_string(),
        temperature: DEFAULT_TEMPERATURE,
        max_tokens: DEFAULT_MAX_TOKENS,
        message_count: 0,
        total_tokens: 0,
        last_message_at: now,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO conversations (id, user_id, title, is_active, model, temperature,
                                   max_tokens, message_count, total_tokens,
                                   last_message_at, created_at, updated_at)
        VALUES (?, ?, ?, 1, ?, ?, ?, 0, 0, ?, ?, ?)
        "#,
    )
    .bind(conversation.id.to_string())
    .bind(conversation.user_id.to_string())
    .bind(&conversation.title)
    .bind(&conversation.model)
    .bind(conversation.temperature)
    .bind(conversation.max_tokens)
    .bind(fmt_ts(conversation.last_message_at))
    .bind(fmt_ts(conversation.created_at))
    .bind(fmt_ts(conversation.updated_at))
    .execute(pool)
    .await?;

    Ok(conversation)
}

/// Resolve a conversation that the caller owns and has not soft-deleted.
pub async fn find_owned_active(
    pool: &SqlitePool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    let row = sqlx::query_as::<_, ConversationRow>(&format!(
        "SELECT {CONVERSATION_COLUMNS} FROM conversations \
         WHERE id = ? AND user_id = ? AND is_active = 1"
    ))
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(ConversationRow::into_conversation).transpose()
}

/// Rename a conversation the caller owns. Returns the updated row, or
/// `None` when no owned active conversation matched.
pub async fn rename_conversation(
    pool: &SqlitePool,
    conversation_id: Uuid,
    user_id: Uuid,
    title: &str,
) -> Result<Option<Conversation>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE conversations SET title = ?, updated_at = ? \
         WHERE id = ? AND user_id = ? AND is_active = 1",
    )
    .bind(title)
    .bind(fmt_ts(Utc::now()))
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_owned_active(pool, conversation_id, user_id).await
}

/// Soft-delete a conversation. Matches on ownership only, so deleting an
/// already-deleted conversation succeeds, as in the upstream behavior.
pub async fn soft_delete_conversation(
    pool: &SqlitePool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE conversations SET is_active = 0, updated_at = ? \
         WHERE id = ? AND user_id = ?",
    )
    .bind(fmt_ts(Utc::now()))
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Count the caller's active conversations.
pub async fn count_active_conversations(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM conversations WHERE user_id = ? AND is_active = 1",
    )
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// One page of a conversation's messages in creation order.
pub async fn messages_page(
    pool: &SqlitePool,
    conversation_id: Uuid,
    page: i64,
    limit: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MessageRow>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ? \
         ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?"
    ))
    .bind(conversation_id.to_string())
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(MessageRow::into_message).collect()
}

/// Count a conversation's messages.
pub async fn count_messages(
    pool: &SqlitePool,
    conversation_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
            .bind(conversation_id.to_string())
            .fetch_one(pool)
            .await?;

    Ok(count)
}

/// Count every message a user has in the store, across conversations.
pub async fn count_messages_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE user_id = ?")
        .bind(user_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// The trailing `limit` turns of a conversation, oldest first. This is the
/// context window handed to the response generator.
pub async fn recent_turns(
    pool: &SqlitePool,
    conversation_id: Uuid,
    limit: usize,
) -> Result<Vec<Message>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MessageRow>(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages WHERE conversation_id = ? \
         ORDER BY created_at DESC, rowid DESC LIMIT ?"
    ))
    .bind(conversation_id.to_string())
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    let mut messages: Vec<Message> = rows
        .into_iter()
        .map(MessageRow::into_message)
        .collect::<Result<_, _>>()?;
    messages.reverse();
    Ok(messages)
}

/// Persist a user turn, then bump the conversation counters.
///
/// The two statements are sequential, not transactional; each one is
/// atomic on its own and the write order matches the documented send
/// sequence.
pub async fn record_user_turn(
    pool: &SqlitePool,
    conversation: &Conversation,
    content: &str,
) -> Result<Message, sqlx::Error> {
    let now = Utc::now();
    let message = Message {
        id: Uuid::new_v4(),
        conversation_id: conversation.id,
        user_id: conversation.user_id,
        content: content.to_string(),
        role: MessageRole::User,
        tokens: 0,
        model: None,
        temperature: None,
        processing_time_ms: 0,
        is_edited: false,
        edited_at: None,
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, user_id, content, role, tokens,
                              model, temperature, processing_time_ms, is_edited,
                              edited_at, created_at)
        VALUES (?, ?, ?, ?, 'user', 0, NULL, NULL, 0, 0, NULL, ?)
        "#,
    )
    .bind(message.id.to_string())
    .bind(message.conversation_id.to_string())
    .bind(message.user_id.to_string())
    .bind(&message.content)
    .bind(fmt_ts(message.created_at))
    .execute(pool)
    .await?;

    sqlx::query(
        "UPDATE conversations SET message_count = message_count + 1, \
         last_message_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(fmt_ts(now))
    .bind(fmt_ts(now))
    .bind(conversation.id.to_string())
    .execute(pool)
    .await?;

    Ok(message)
}

/// Persist an assistant turn with its generation metadata, then bump the
/// conversation counters including the token total.
pub async fn record_assistant_turn(
    pool: &SqlitePool,
    conversation: &Conversation,
    reply: &GeneratedReply,
) -> Result<Message, sqlx::Error> {
    let now = Utc::now();
    let message = Message {
        id: Uuid::new_v4(),
        conversation_id: conversation.id,
        user_id: conversation.user_id,
        content: reply.content.clone(),
        role: MessageRole::Assistant,
        tokens: reply.tokens,
        model: Some(conversation.model.clone()),
        temperature: Some(conversation.temperature),
        processing_time_ms: reply.processing_time_ms,
        is_edited: false,
        edited_at: None,
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, user_id, content, role, tokens,
                              model, temperature, processing_time_ms, is_edited,
                              edited_at, created_at)
        VALUES (?, ?, ?, ?, 'assistant', ?, ?, ?, ?, 0, NULL, ?)
        "#,
    )
    .bind(message.id.to_string())
    .bind(message.conversation_id.to_string())
    .bind(message.user_id.to_string())
    .bind(&message.content)
    .bind(message.tokens)
    .bind(&message.model)
    .bind(message.temperature)
    .bind(message.processing_time_ms)
    .bind(fmt_ts(message.created_at))
    .execute(pool)
    .await?;

    sqlx::query(
        "UPDATE conversations SET message_count = message_count + 1, \
         total_tokens = total_tokens + ?, last_message_at = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(message.tokens)
    .bind(fmt_ts(now))
    .bind(fmt_ts(now))
    .bind(conversation.id.to_string())
    .execute(pool)
    .await?;

    Ok(message)
}

/// Undo `record_user_turn` after a failed generation: delete the turn and
/// restore the counters to the values of the conversation row loaded
/// before the send.
pub async fn rollback_user_turn(
    pool: &SqlitePool,
    conversation: &Conversation,
    message_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(message_id.to_string())
        .execute(pool)
        .await?;

    sqlx::query(
        "UPDATE conversations SET message_count = message_count - 1, \
         last_message_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(fmt_ts(conversation.last_message_at))
    .bind(fmt_ts(Utc::now()))
    .bind(conversation.id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Edit a message in place. No route exposes this yet; the flag and
/// timestamp exist for the planned edit surface.
pub async fn mark_edited(
    pool: &SqlitePool,
    message_id: Uuid,
    content: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE messages SET content = ?, is_edited = 1, edited_at = ? WHERE id = ?",
    )
    .bind(content)
    .bind(fmt_ts(Utc::now()))
    .bind(message_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
