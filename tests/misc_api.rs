//! Health endpoint and error-envelope tests.

mod common;

use common::{register_user, spawn_app, with_bearer};
use pretty_assertions::assert_eq;
use serde_json::Value;

#[tokio::test]
async fn health_reports_status_and_uptime() {
    let app = spawn_app().await;

    let response = app.server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].as_str().is_some());
    assert!(body["uptime"].as_f64().is_some());
}

#[tokio::test]
async fn health_requires_no_token() {
    let app = spawn_app().await;
    let response = app.server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = spawn_app().await;

    let response = app.server.get("/api/unknown/route").await;
    assert_eq!(response.status_code(), 404);

    let body: Value = response.json();
    assert_eq!(body["code"], "ROUTE_NOT_FOUND");
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn protected_routes_refuse_missing_token() {
    let app = spawn_app().await;

    for (method, path) in [
        ("GET", "/api/chat/conversations"),
        ("GET", "/api/user/notifications"),
        ("GET", "/api/user/profile"),
        ("GET", "/api/user/stats"),
        ("GET", "/api/realtime"),
    ] {
        let response = match method {
            "GET" => app.server.get(path).await,
            other => panic!("unexpected method {other}"),
        };
        assert_eq!(response.status_code(), 401, "{path}");
        let body: Value = response.json();
        assert_eq!(body["code"], "NO_TOKEN", "{path}");
    }
}

#[tokio::test]
async fn expired_style_garbage_tokens_are_classified() {
    let app = spawn_app().await;
    register_user(&app, "alice").await;

    // Structurally valid JWT signed with a different secret
    let forged = corechat::auth::tokens::issue_access_token(
        uuid::Uuid::new_v4(),
        "some-other-secret",
    )
    .unwrap();

    let response = with_bearer(app.server.get("/api/auth/me"), &forged).await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn valid_token_for_deleted_user_is_invalid_user() {
    let app = spawn_app().await;
    let (token, user_id) = register_user(&app, "alice").await;

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(user_id.to_string())
        .execute(&app.pool)
        .await
        .unwrap();

    let response = with_bearer(app.server.get("/api/auth/me"), &token).await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_USER");
}
