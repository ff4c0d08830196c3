/**
 * Send-Message Orchestrator
 *
 * POST /api/chat/conversations/{id}/messages
 *
 * The one handler that touches several stores in a single request:
 *
 * 1. Resolve the target conversation (owned by the caller, active)
 * 2. Debit one credit with a conditional single-statement decrement; a
 *    zero balance fails here with 402 before anything is written
 * 3. Persist the user turn and bump the conversation counters
 * 4. Invoke the response generator with the trailing conversation window
 * 5. On generator failure, compensate: delete the user turn, restore the
 *    counters, refund the credit, and surface a generic 500
 * 6. Persist the assistant turn with its token/latency metadata and bump
 *    the counters again
 * 7. Fan out a realtime event and return both turns plus the new balance
 *
 * The conditional decrement in step 2 is what makes two simultaneous
 * sends against a balance of 1 resolve to exactly one success.
 */

use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::ai::{ChatTurn, HISTORY_WINDOW};
use crate::auth::users;
use crate::chat::db;
use crate::chat::handlers::conversations::parse_conversation_id;
use crate::chat::handlers::types::{MessageResponse, SendMessageRequest, SendMessageResponse};
use crate::error::{ApiError, Resource};
use crate::middleware::auth::AuthUser;
use crate::realtime::broadcast::{broadcast_event, RealtimeEvent};
use crate::server::state::AppState;
use crate::validation::validate_content;

const ERR_CODE: &str = "SEND_MESSAGE_ERROR";
const ERR_MESSAGE: &str = "Failed to send message";

fn internal(e: impl std::fmt::Display) -> ApiError {
    ApiError::internal(ERR_CODE, ERR_MESSAGE, e)
}

/// Send message handler
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let content = request.content.trim().to_string();
    if let Some(error) = validate_content(&content) {
        return Err(ApiError::Validation(vec![error]));
    }

    let conversation = db::find_owned_active(&state.pool, conversation_id, user.id)
        .await
        .map_err(internal)?
        .ok_or(ApiError::not_found(Resource::Conversation))?;

    // Conditional decrement doubles as the balance precondition: nothing
    // has been written yet when it refuses.
    let debited = users::debit_credit(&state.pool, user.id)
        .await
        .map_err(internal)?;
    if !debited {
        tracing::warn!("Insufficient credits for user {}", user.id);
        return Err(ApiError::InsufficientCredits);
    }

    let history: Vec<ChatTurn> = db::recent_turns(&state.pool, conversation.id, HISTORY_WINDOW)
        .await
        .map_err(internal)?
        .iter()
        .map(|message| ChatTurn {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        })
        .collect();

    let user_message = db::record_user_turn(&state.pool, &conversation, &content)
        .await
        .map_err(internal)?;

    let reply = state
        .generator
        .generate(&content, &history, &conversation.settings())
        .await;

    let reply = match reply {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("Response generation failed: {}", e);
            // Compensate the writes above so the caller is not charged
            // for an unanswered turn.
            if let Err(rollback_err) =
                db::rollback_user_turn(&state.pool, &conversation, user_message.id).await
            {
                tracing::error!("Failed to roll back user turn: {}", rollback_err);
            }
            if let Err(refund_err) = users::refund_credit(&state.pool, user.id).await {
                tracing::error!("Failed to refund credit: {}", refund_err);
            }
            return Err(internal(e));
        }
    };

    let ai_message = db::record_assistant_turn(&state.pool, &conversation, &reply)
        .await
        .map_err(internal)?;

    let credits = users::get_user_by_id(&state.pool, user.id)
        .await
        .map_err(internal)?
        .map(|user| user.credits)
        .unwrap_or(user.credits - 1);

    let user_message = MessageResponse::from(&user_message);
    let ai_message = MessageResponse::from(&ai_message);

    broadcast_event(
        &state.events,
        RealtimeEvent::message(
            user.id,
            conversation.id,
            serde_json::json!({
                "conversationId": conversation.id.to_string(),
                "userMessage": serde_json::to_value(&user_message).unwrap_or_default(),
                "aiMessage": serde_json::to_value(&ai_message).unwrap_or_default(),
            }),
        ),
    );

    Ok(Json(SendMessageResponse {
        message: "Message sent successfully",
        user_message,
        ai_message,
        credits,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{
        GeneratedReply, GenerationSettings, GeneratorError, ResponseGenerator,
    };
    use crate::auth::users::{create_user, DEFAULT_CREDIT_GRANT};
    use crate::chat::db::{count_messages, create_conversation, find_owned_active, MessageRole};
    use crate::db::test_util::memory_pool;
    use crate::server::state::AppState;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FailingGenerator;

    #[async_trait]
    impl ResponseGenerator for FailingGenerator {
        async fn generate(
            &self,
            _content: &str,
            _history: &[ChatTurn],
            _settings: &GenerationSettings,
        ) -> Result<GeneratedReply, GeneratorError> {
            Err(GeneratorError::InvalidResponse)
        }
    }

    async fn fixture() -> (AppState, crate::auth::users::User, uuid::Uuid) {
        let state = AppState::for_tests(memory_pool().await);
        let user = create_user(&state.pool, "alice", "hash").await.unwrap();
        let conversation = create_conversation(&state.pool, user.id, "Chat")
            .await
            .unwrap();
        (state, user, conversation.id)
    }

    fn request(content: &str) -> Json<SendMessageRequest> {
        Json(SendMessageRequest {
            content: content.to_string(),
        })
    }

    #[tokio::test]
    async fn test_send_persists_both_turns_and_debits() {
        let (state, user, conversation_id) = fixture().await;

        let response = send_message(
            State(state.clone()),
            AuthUser(user.clone()),
            Path(conversation_id.to_string()),
            request("Hello there"),
        )
        .await
        .unwrap();

        assert_eq!(response.user_message.role, MessageRole::User);
        assert_eq!(response.ai_message.role, MessageRole::Assistant);
        assert_eq!(response.credits, DEFAULT_CREDIT_GRANT - 1);
        assert!(response.ai_message.metadata.tokens > 0);

        let conversation = find_owned_active(&state.pool, conversation_id, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.message_count, 2);
        assert_eq!(
            conversation.total_tokens,
            response.ai_message.metadata.tokens
        );
    }

    #[tokio::test]
    async fn test_zero_balance_fails_without_writes() {
        let (state, user, conversation_id) = fixture().await;
        for _ in 0..DEFAULT_CREDIT_GRANT {
            assert!(users::debit_credit(&state.pool, user.id).await.unwrap());
        }

        let result = send_message(
            State(state.clone()),
            AuthUser(user.clone()),
            Path(conversation_id.to_string()),
            request("Hello"),
        )
        .await;

        assert!(matches!(result, Err(ApiError::InsufficientCredits)));
        assert_eq!(
            count_messages(&state.pool, conversation_id).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_not_found() {
        let (state, user, _) = fixture().await;

        let result = send_message(
            State(state.clone()),
            AuthUser(user.clone()),
            Path(uuid::Uuid::new_v4().to_string()),
            request("Hello"),
        )
        .await;

        assert!(matches!(
            result,
            Err(ApiError::NotFound(Resource::Conversation))
        ));
    }

    #[tokio::test]
    async fn test_generation_failure_compensates() {
        let (mut state, user, conversation_id) = fixture().await;
        state.generator = Arc::new(FailingGenerator);

        let result = send_message(
            State(state.clone()),
            AuthUser(user.clone()),
            Path(conversation_id.to_string()),
            request("Hello"),
        )
        .await;

        match result {
            Err(err) => assert_eq!(err.code(), "SEND_MESSAGE_ERROR"),
            Ok(_) => panic!("expected generation failure"),
        }

        // The user turn was rolled back and the credit refunded
        assert_eq!(
            count_messages(&state.pool, conversation_id).await.unwrap(),
            0
        );
        let user = users::get_user_by_id(&state.pool, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.credits, DEFAULT_CREDIT_GRANT);

        let conversation = find_owned_active(&state.pool, conversation_id, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(conversation.message_count, 0);
    }

    #[tokio::test]
    async fn test_empty_content_is_validation_error() {
        let (state, user, conversation_id) = fixture().await;

        let result = send_message(
            State(state.clone()),
            AuthUser(user.clone()),
            Path(conversation_id.to_string()),
            request("   "),
        )
        .await;

        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
