/**
 * Authentication Handlers
 *
 * Route handlers for the /api/auth endpoints:
 * - `POST /api/auth/register` - create an account, return a token pair
 * - `POST /api/auth/login`    - verify credentials, return a token pair
 * - `POST /api/auth/refresh`  - exchange a refresh token for a new pair
 * - `GET  /api/auth/me`       - current user (behind the auth middleware)
 */

pub mod login;
pub mod me;
pub mod refresh;
pub mod register;
pub mod types;

pub use login::login;
pub use me::get_me;
pub use refresh::refresh;
pub use register::register;
