//! Chat surface tests: conversation CRUD, message listing, and the
//! send-message orchestrator's credit and counter accounting.

mod common;

use common::{
    create_conversation, get_credits, register_user, set_credits, spawn_app, with_bearer,
    STUB_TOKENS,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn create_and_list_conversations() {
    let app = spawn_app().await;
    let (token, _) = register_user(&app, "alice").await;

    create_conversation(&app, &token, "First chat").await;
    create_conversation(&app, &token, "Second chat").await;

    let response = with_bearer(app.server.get("/api/chat/conversations"), &token).await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let conversations = body["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0]["messageCount"], 0);
}

#[tokio::test]
async fn conversations_are_per_user() {
    let app = spawn_app().await;
    let (alice, _) = register_user(&app, "alice").await;
    let (bob, _) = register_user(&app, "bob").await;

    let conversation_id = create_conversation(&app, &alice, "Private").await;

    // Bob cannot see or touch Alice's conversation
    let listing: Value = with_bearer(app.server.get("/api/chat/conversations"), &bob)
        .await
        .json();
    assert_eq!(listing["conversations"].as_array().unwrap().len(), 0);

    let response = with_bearer(
        app.server
            .get(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &bob,
    )
    .await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONVERSATION_NOT_FOUND");
}

#[tokio::test]
async fn send_message_persists_two_turns_and_debits_one_credit() {
    let app = spawn_app().await;
    let (token, user_id) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;

    let response = with_bearer(
        app.server
            .post(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .json(&json!({ "content": "Hello assistant" }))
    .await;

    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body: Value = response.json();
    assert_eq!(body["userMessage"]["role"], "user");
    assert_eq!(body["aiMessage"]["role"], "assistant");
    assert_eq!(body["aiMessage"]["metadata"]["tokens"], STUB_TOKENS);
    assert_eq!(body["credits"], 99);
    assert_eq!(get_credits(&app.pool, user_id).await, 99);

    // Both turns come back in creation order
    let messages: Value = with_bearer(
        app.server
            .get(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .await
    .json();
    let listed = messages["messages"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["role"], "user");
    assert_eq!(listed[0]["content"], "Hello assistant");
    assert_eq!(listed[1]["role"], "assistant");
    assert_eq!(messages["pagination"]["total"], 2);
}

#[tokio::test]
async fn counters_accumulate_over_sends() {
    let app = spawn_app().await;
    let (token, _) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;

    for i in 0..3 {
        let response = with_bearer(
            app.server
                .post(&format!("/api/chat/conversations/{conversation_id}/messages")),
            &token,
        )
        .json(&json!({ "content": format!("message {i}") }))
        .await;
        assert_eq!(response.status_code(), 200);
    }

    let listing: Value = with_bearer(app.server.get("/api/chat/conversations"), &token)
        .await
        .json();
    let conversation = &listing["conversations"][0];
    assert_eq!(conversation["messageCount"], 6);

    // total_tokens is the sum of assistant-turn token metadata
    let (total_tokens,): (i64,) =
        sqlx::query_as("SELECT total_tokens FROM conversations WHERE id = ?")
            .bind(&conversation_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(total_tokens, 3 * STUB_TOKENS);
}

#[tokio::test]
async fn send_with_zero_balance_fails_and_persists_nothing() {
    let app = spawn_app().await;
    let (token, user_id) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;
    set_credits(&app.pool, user_id, 0).await;

    let response = with_bearer(
        app.server
            .post(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .json(&json!({ "content": "Hello" }))
    .await;

    assert_eq!(response.status_code(), 402);
    let body: Value = response.json();
    assert_eq!(body["code"], "INSUFFICIENT_CREDITS");

    let messages: Value = with_bearer(
        app.server
            .get(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .await
    .json();
    assert_eq!(messages["pagination"]["total"], 0);
    assert_eq!(get_credits(&app.pool, user_id).await, 0);
}

#[tokio::test]
async fn last_credit_send_leaves_zero_balance_and_two_messages() {
    let app = spawn_app().await;
    let (token, user_id) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;
    set_credits(&app.pool, user_id, 1).await;

    let response = with_bearer(
        app.server
            .post(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .json(&json!({ "content": "Hello" }))
    .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["credits"], 0);

    let messages: Value = with_bearer(
        app.server
            .get(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .await
    .json();
    assert_eq!(messages["pagination"]["total"], 2);
}

#[tokio::test]
async fn generation_failure_rolls_back_and_refunds() {
    let app = spawn_app().await;
    let (token, user_id) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;

    app.generator.fail.store(true, Ordering::SeqCst);
    let response = with_bearer(
        app.server
            .post(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .json(&json!({ "content": "Hello" }))
    .await;
    app.generator.fail.store(false, Ordering::SeqCst);

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "SEND_MESSAGE_ERROR");

    // Compensation: no persisted turn, no charge
    let messages: Value = with_bearer(
        app.server
            .get(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .await
    .json();
    assert_eq!(messages["pagination"]["total"], 0);
    assert_eq!(get_credits(&app.pool, user_id).await, 100);
}

#[tokio::test]
async fn message_pagination_pages_through_turns() {
    let app = spawn_app().await;
    let (token, _) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;

    for i in 0..3 {
        with_bearer(
            app.server
                .post(&format!("/api/chat/conversations/{conversation_id}/messages")),
            &token,
        )
        .json(&json!({ "content": format!("message {i}") }))
        .await
        .assert_status_ok();
    }

    let page: Value = with_bearer(
        app.server.get(&format!(
            "/api/chat/conversations/{conversation_id}/messages?page=2&limit=2"
        )),
        &token,
    )
    .await
    .json();

    assert_eq!(page["pagination"]["page"], 2);
    assert_eq!(page["pagination"]["limit"], 2);
    assert_eq!(page["pagination"]["total"], 6);
    assert_eq!(page["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn rename_conversation() {
    let app = spawn_app().await;
    let (token, _) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Old title").await;

    let response = with_bearer(
        app.server
            .put(&format!("/api/chat/conversations/{conversation_id}")),
        &token,
    )
    .json(&json!({ "title": "New title" }))
    .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["conversation"]["title"], "New title");
}

#[tokio::test]
async fn rename_with_empty_title_is_rejected() {
    let app = spawn_app().await;
    let (token, _) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;

    let response = with_bearer(
        app.server
            .put(&format!("/api/chat/conversations/{conversation_id}")),
        &token,
    )
    .json(&json!({ "title": "   " }))
    .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_TITLE");
}

#[tokio::test]
async fn soft_delete_hides_conversation_but_keeps_rows() {
    let app = spawn_app().await;
    let (token, _) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;

    with_bearer(
        app.server
            .post(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .json(&json!({ "content": "Hello" }))
    .await
    .assert_status_ok();

    let response = with_bearer(
        app.server
            .delete(&format!("/api/chat/conversations/{conversation_id}")),
        &token,
    )
    .await;
    assert_eq!(response.status_code(), 200);

    // Gone from the listing and from the messages route
    let listing: Value = with_bearer(app.server.get("/api/chat/conversations"), &token)
        .await
        .json();
    assert_eq!(listing["conversations"].as_array().unwrap().len(), 0);

    let messages = with_bearer(
        app.server
            .get(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .await;
    assert_eq!(messages.status_code(), 404);

    // But nothing purges the rows
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
            .bind(&conversation_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn unknown_conversation_is_404() {
    let app = spawn_app().await;
    let (token, _) = register_user(&app, "alice").await;

    let response = with_bearer(
        app.server.post(&format!(
            "/api/chat/conversations/{}/messages",
            uuid::Uuid::new_v4()
        )),
        &token,
    )
    .json(&json!({ "content": "Hello" }))
    .await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONVERSATION_NOT_FOUND");
}

#[tokio::test]
async fn empty_content_is_validation_error() {
    let app = spawn_app().await;
    let (token, _) = register_user(&app, "alice").await;
    let conversation_id = create_conversation(&app, &token, "Chat").await;

    let response = with_bearer(
        app.server
            .post(&format!("/api/chat/conversations/{conversation_id}/messages")),
        &token,
    )
    .json(&json!({ "content": "" }))
    .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
