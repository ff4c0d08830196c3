/**
 * Server Initialization
 *
 * Builds the running application from a loaded configuration:
 *
 * 1. Open the SQLite pool (WAL mode, foreign keys, create-if-missing)
 * 2. Run migrations
 * 3. Pick the response generator (pass-through when an API key is
 *    configured, mock otherwise)
 * 4. Create the realtime broadcast channel and rate limiter
 * 5. Assemble the router
 */

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tokio::sync::broadcast;

use crate::ai::{GeminiGenerator, MockGenerator, ResponseGenerator};
use crate::middleware::rate_limit::RateLimiter;
use crate::realtime::broadcast::{RealtimeEvent, EVENT_CHANNEL_CAPACITY};
use crate::routes::router::create_router;
use crate::server::config::AppConfig;
use crate::server::state::AppState;

/// Create and configure the application router.
pub async fn create_app(config: AppConfig) -> Result<Router, sqlx::Error> {
    tracing::info!("Initializing corechat server");

    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(std::time::Duration::from_secs(5))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    tracing::info!("Running database migrations");
    sqlx::migrate!().run(&pool).await?;

    let generator: Arc<dyn ResponseGenerator> = match &config.ai.api_key {
        Some(api_key) => {
            tracing::info!("Using generation API pass-through (model {})", config.ai.model);
            Arc::new(GeminiGenerator::new(
                config.ai.api_url.clone(),
                api_key.clone(),
            ))
        }
        None => {
            tracing::warn!("AI_API_KEY not set; falling back to the mock generator");
            Arc::new(MockGenerator::new())
        }
    };

    let (events, _) = broadcast::channel::<RealtimeEvent>(EVENT_CHANNEL_CAPACITY);
    let limiter = RateLimiter::new(config.rate_limit_window, config.rate_limit_max);

    let state = AppState {
        pool,
        config: Arc::new(config),
        generator,
        events,
        limiter,
        started_at: Instant::now(),
    };

    tracing::info!("Router configured");
    Ok(create_router(state))
}
