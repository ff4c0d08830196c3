/**
 * Server setup: configuration loading, application assembly, and shared
 * state.
 */

pub mod config;
pub mod init;
pub mod state;

pub use config::AppConfig;
pub use init::create_app;
pub use state::AppState;
