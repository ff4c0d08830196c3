/**
 * Authentication and user management: the token service, the user store,
 * and the register/login/refresh/me handlers.
 */

pub mod handlers;
pub mod tokens;
pub mod users;

pub use handlers::{get_me, login, refresh, register};
