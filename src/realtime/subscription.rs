/**
 * Real-time Subscription Handler
 *
 * Server-Sent Events endpoint at `GET /api/realtime`. The route sits
 * behind the same bearer-token middleware as the REST surface, so a
 * subscriber is always a verified, active user; the stream then only
 * carries events addressed to that user.
 *
 * # Query Parameters
 *
 * - `conversation` - optional conversation id; when present, message
 *   events for other conversations are filtered out (notification events
 *   always pass)
 *
 * A subscriber that falls behind the channel capacity misses the lagged
 * events but keeps its connection; this channel only ever echoes state
 * the REST API already persisted.
 */

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::realtime::broadcast::{EventBroadcast, EventKind, RealtimeEvent};

#[derive(Debug, Deserialize)]
pub struct RealtimeQuery {
    /// Restrict message events to one conversation
    pub conversation: Option<Uuid>,
}

fn wants(event: &RealtimeEvent, user_id: Uuid, conversation: Option<Uuid>) -> bool {
    if event.user_id != user_id {
        return false;
    }
    match (event.kind, conversation) {
        (EventKind::Message, Some(filter)) => event.conversation_id == Some(filter),
        _ => true,
    }
}

/// Handle real-time subscription (GET /api/realtime)
pub async fn handle_realtime_subscription(
    State(events): State<EventBroadcast>,
    AuthUser(user): AuthUser,
    Query(query): Query<RealtimeQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("[Realtime] Subscription opened for user {}", user.id);

    let user_id = user.id;
    let conversation = query.conversation;

    let stream = BroadcastStream::new(events.subscribe()).filter_map(move |received| {
        let event = match received {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                tracing::warn!("[Realtime] Subscriber lagged, {} events dropped", missed);
                return None;
            }
        };

        if !wants(&event, user_id, conversation) {
            return None;
        }

        match serde_json::to_string(&event) {
            Ok(data) => Some(Ok(Event::default().event(event.kind.as_str()).data(data))),
            Err(e) => {
                tracing::error!("[Realtime] Failed to serialize event: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_user() {
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        let event = RealtimeEvent::notification(other, serde_json::json!({}));

        assert!(!wants(&event, user, None));
        assert!(wants(&event, other, None));
    }

    #[test]
    fn test_filter_message_events_by_conversation() {
        let user = Uuid::new_v4();
        let conversation = Uuid::new_v4();
        let event = RealtimeEvent::message(user, conversation, serde_json::json!({}));

        assert!(wants(&event, user, None));
        assert!(wants(&event, user, Some(conversation)));
        assert!(!wants(&event, user, Some(Uuid::new_v4())));
    }

    #[test]
    fn test_notifications_ignore_conversation_filter() {
        let user = Uuid::new_v4();
        let event = RealtimeEvent::notification(user, serde_json::json!({}));

        assert!(wants(&event, user, Some(Uuid::new_v4())));
    }
}
