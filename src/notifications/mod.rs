/**
 * Notifications: per-user notices with read state. Pull-based access via
 * the /api/user/notifications endpoints; creation happens on system
 * events (currently registration) and echoes onto the realtime channel.
 */

pub mod db;
pub mod handlers;
