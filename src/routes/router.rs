/**
 * Router Configuration
 *
 * Assembles the full application router: the /api routes, the
 * rate-limiting layer over all of them, CORS, request tracing, the 10 MB
 * body limit, and the JSON 404 fallback.
 */

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Resource};
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::server::state::AppState;

/// Request bodies above this size are rejected before any handler runs.
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Create the application router with all routes and layers configured.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    crate::routes::api_routes::configure_api_routes(state.clone())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .fallback(|| async { ApiError::not_found(Resource::Route) })
        .with_state(state)
}
