//! Shared fixtures for the integration suite.
//!
//! `spawn_app` builds the full router over a file-backed temporary SQLite
//! database (file-backed so concurrent requests share one store) and a
//! scripted generator whose replies carry a fixed token count, which the
//! counter-accounting tests rely on.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use axum_test::{TestRequest, TestServer};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use uuid::Uuid;

use corechat::ai::{
    ChatTurn, GeneratedReply, GenerationSettings, GeneratorError, ResponseGenerator,
};
use corechat::middleware::rate_limit::RateLimiter;
use corechat::server::config::{AiSettings, AppConfig};
use corechat::server::state::AppState;

pub const TEST_PASSWORD: &str = "password123";
/// Token count every scripted reply reports.
pub const STUB_TOKENS: i64 = 42;

/// Generator with a fixed reply and a failure switch.
#[derive(Default)]
pub struct StubGenerator {
    pub fail: AtomicBool,
}

#[async_trait]
impl ResponseGenerator for StubGenerator {
    async fn generate(
        &self,
        _content: &str,
        _history: &[ChatTurn],
        _settings: &GenerationSettings,
    ) -> Result<GeneratedReply, GeneratorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GeneratorError::InvalidResponse);
        }
        Ok(GeneratedReply {
            content: "Scripted generated reply".to_string(),
            tokens: STUB_TOKENS,
            processing_time_ms: 7,
        })
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub generator: Arc<StubGenerator>,
    _db_dir: tempfile::TempDir,
}

/// Build the application over a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let db_dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = db_dir.path().join("corechat-test.db");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&database_url)
        .expect("bad database url")
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .expect("failed to open test database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let config = AppConfig {
        port: 0,
        database_url,
        jwt_secret: "integration-test-signing-secret".to_string(),
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 100_000,
        ai: AiSettings {
            api_key: None,
            api_url: String::new(),
            model: "gpt-3.5-turbo".to_string(),
        },
        development: false,
    };

    let generator = Arc::new(StubGenerator::default());
    let (events, _) = broadcast::channel(256);

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config),
        generator: generator.clone(),
        events,
        limiter: RateLimiter::new(Duration::from_secs(60), 100_000),
        started_at: Instant::now(),
    };

    let server = TestServer::new(corechat::create_router(state)).expect("failed to build server");

    TestApp {
        server,
        pool,
        generator,
        _db_dir: db_dir,
    }
}

/// Attach a bearer token to a request.
pub fn with_bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("bad token header"),
    )
}

/// Register a user and return `(access_token, user_id)`.
pub async fn register_user(app: &TestApp, username: &str) -> (String, Uuid) {
    let response = app
        .server
        .post("/api/auth/register")
        .json(&serde_json::json!({
            "username": username,
            "password": TEST_PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), 201, "{}", response.text());

    let body: serde_json::Value = response.json();
    let token = body["token"].as_str().expect("missing token").to_string();
    let user_id = body["user"]["id"]
        .as_str()
        .expect("missing user id")
        .parse()
        .expect("bad user id");
    (token, user_id)
}

/// Create a conversation and return its id.
pub async fn create_conversation(app: &TestApp, token: &str, title: &str) -> String {
    let response = with_bearer(app.server.post("/api/chat/conversations"), token)
        .json(&serde_json::json!({ "title": title }))
        .await;
    assert_eq!(response.status_code(), 201, "{}", response.text());

    let body: serde_json::Value = response.json();
    body["conversation"]["id"]
        .as_str()
        .expect("missing conversation id")
        .to_string()
}

/// Force a user's credit balance directly in the store.
pub async fn set_credits(pool: &SqlitePool, user_id: Uuid, credits: i64) {
    sqlx::query("UPDATE users SET credits = ? WHERE id = ?")
        .bind(credits)
        .bind(user_id.to_string())
        .execute(pool)
        .await
        .expect("failed to set credits");
}

/// Read a user's credit balance directly from the store.
pub async fn get_credits(pool: &SqlitePool, user_id: Uuid) -> i64 {
    let (credits,): (i64,) = sqlx::query_as("SELECT credits FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_one(pool)
        .await
        .expect("failed to read credits");
    credits
}
