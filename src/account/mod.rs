/**
 * Account surface: profile read/update and usage stats for the
 * authenticated user.
 */

pub mod handlers;

pub use handlers::{get_profile, get_stats, update_profile};
