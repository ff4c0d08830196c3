/**
 * Application State Management
 *
 * `AppState` is the central state container cloned into every handler:
 * the store pool, the loaded configuration, the response generator, the
 * realtime broadcast channel, the rate limiter, and the process start
 * instant for the health endpoint.
 *
 * `FromRef` implementations let handlers that only touch one piece
 * extract it directly instead of taking the whole state.
 */

use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::ai::ResponseGenerator;
use crate::middleware::rate_limit::RateLimiter;
use crate::realtime::broadcast::EventBroadcast;
use crate::server::config::AppConfig;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store connection pool
    pub pool: SqlitePool,
    /// Configuration loaded at startup
    pub config: Arc<AppConfig>,
    /// Response-generation collaborator (pass-through or mock)
    pub generator: Arc<dyn ResponseGenerator>,
    /// Realtime fan-out channel
    pub events: EventBroadcast,
    /// Fixed-window rate limiter
    pub limiter: RateLimiter,
    /// Process start, reported as uptime by the health endpoint
    pub started_at: Instant,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for EventBroadcast {
    fn from_ref(state: &AppState) -> Self {
        state.events.clone()
    }
}

#[cfg(test)]
impl AppState {
    /// State over an existing pool with a mock generator and permissive
    /// limits, for handler unit tests.
    pub(crate) fn for_tests(pool: SqlitePool) -> Self {
        use crate::ai::MockGenerator;
        use crate::server::config::AiSettings;

        let config = AppConfig {
            port: 0,
            database_url: String::new(),
            jwt_secret: "unit-test-signing-secret".to_string(),
            rate_limit_window: std::time::Duration::from_secs(60),
            rate_limit_max: 10_000,
            ai: AiSettings {
                api_key: None,
                api_url: String::new(),
                model: "gpt-3.5-turbo".to_string(),
            },
            development: false,
        };

        let (events, _) = tokio::sync::broadcast::channel(64);

        Self {
            pool,
            config: Arc::new(config),
            generator: Arc::new(MockGenerator::new()),
            events,
            limiter: RateLimiter::new(std::time::Duration::from_secs(60), 10_000),
            started_at: Instant::now(),
        }
    }
}
