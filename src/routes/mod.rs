/**
 * Route configuration: router assembly, /api endpoint wiring, and the
 * health endpoint.
 */

pub mod api_routes;
pub mod health;
pub mod router;

pub use router::create_router;
