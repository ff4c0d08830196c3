/**
 * Fixed-Window Rate Limiting
 *
 * Per-IP fixed window over every /api route. The window length and
 * request cap come from configuration. State is an in-process map; a
 * multi-instance deployment would need a shared store, which this service
 * does not attempt.
 */

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::server::state::AppState;

#[derive(Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
    window: Duration,
    max: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            window,
            max,
        }
    }

    /// Record a hit for `ip`. Returns `false` when the caller is over the
    /// cap for the current window.
    pub fn check(&self, ip: IpAddr) -> bool {
        let mut windows = self.windows.lock().unwrap();
        let now = Instant::now();

        let entry = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        entry.count += 1;
        entry.count <= self.max
    }
}

/// Rate limiting middleware for the /api router.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Requests without a peer address (in-process test clients) carry no
    // ConnectInfo extension and are not limited.
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    if let Some(ip) = ip {
        if !state.limiter.check(ip) {
            tracing::warn!("Rate limit exceeded for {}", ip);
            return Err(ApiError::RateLimited);
        }
    }

    Ok(next.run(request).await)
}
