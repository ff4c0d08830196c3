/**
 * Real-time Event Fan-Out
 *
 * Server-to-client event delivery over Server-Sent Events. The REST
 * handlers broadcast events onto a process-wide channel; authenticated
 * subscribers receive the subset addressed to them. This channel is a
 * best-effort echo of state that is already durable - it accepts no client
 * events and is never a write path.
 */

pub mod broadcast;
pub mod subscription;

pub use broadcast::{broadcast_event, EventBroadcast, EventKind, RealtimeEvent};
pub use subscription::handle_realtime_subscription;
