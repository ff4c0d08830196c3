/**
 * Real-time Event Broadcasting
 *
 * Events are broadcast using `tokio::sync::broadcast`: every subscriber
 * receives a copy of each event and filters for the ones addressed to it.
 * Sending with no subscribers is not an error.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the process-wide event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// What an event announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A chat exchange was recorded
    Message,
    /// A notification was created for the user
    Notification,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Notification => "notification",
        }
    }
}

/// One event on the realtime channel.
///
/// `user_id` addresses the event; subscribers only ever see their own.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    pub kind: EventKind,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Uuid>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl RealtimeEvent {
    /// Event for a recorded chat exchange.
    pub fn message(user_id: Uuid, conversation_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            kind: EventKind::Message,
            user_id,
            conversation_id: Some(conversation_id),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Event for a created notification.
    pub fn notification(user_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            kind: EventKind::Notification,
            user_id,
            conversation_id: None,
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Process-wide broadcast channel for realtime events.
pub type EventBroadcast = broadcast::Sender<RealtimeEvent>;

/// Broadcast an event to all subscribers.
///
/// Returns the number of subscribers that received it (0 when nobody is
/// listening, which is fine).
pub fn broadcast_event(events: &EventBroadcast, event: RealtimeEvent) -> usize {
    match events.send(event) {
        Ok(subscriber_count) => {
            tracing::debug!("[Realtime] Event broadcast to {} subscribers", subscriber_count);
            subscriber_count
        }
        Err(_) => {
            // No subscribers, that's okay
            0
        }
    }
}
