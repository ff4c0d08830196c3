/**
 * API Route Wiring
 *
 * All endpoints live under /api. Registration, login, refresh, and health
 * are public; everything else sits behind the bearer-token middleware,
 * applied as a route layer so unmatched paths still reach the 404
 * fallback rather than a 401.
 */

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::account::handlers::{get_profile, get_stats, update_profile};
use crate::auth::handlers::{get_me, login, refresh, register};
use crate::chat::handlers::{
    create_conversation, delete_conversation, list_conversations, list_messages, send_message,
    update_conversation,
};
use crate::middleware::auth::auth_middleware;
use crate::notifications::handlers::{
    delete_notification, list_notifications, mark_all_notifications_read, mark_notification_read,
};
use crate::realtime::subscription::handle_realtime_subscription;
use crate::routes::health::health;
use crate::server::state::AppState;

/// Configure all /api routes.
pub fn configure_api_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/health", get(health));

    let protected = Router::new()
        .route("/api/auth/me", get(get_me))
        .route(
            "/api/chat/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/chat/conversations/{conversation_id}",
            put(update_conversation).delete(delete_conversation),
        )
        .route(
            "/api/chat/conversations/{conversation_id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/api/user/profile", get(get_profile).put(update_profile))
        .route("/api/user/notifications", get(list_notifications))
        .route(
            "/api/user/notifications/read-all",
            put(mark_all_notifications_read),
        )
        .route(
            "/api/user/notifications/{notification_id}/read",
            put(mark_notification_read),
        )
        .route(
            "/api/user/notifications/{notification_id}",
            delete(delete_notification),
        )
        .route("/api/user/stats", get(get_stats))
        .route("/api/realtime", get(handle_realtime_subscription))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    public.merge(protected)
}
