/**
 * Request Middleware
 *
 * - `auth` - bearer-token authentication for the protected route group
 * - `rate_limit` - fixed-window per-IP limiter over all /api routes
 */

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
