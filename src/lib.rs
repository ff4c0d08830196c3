//! corechat - Main Library
//!
//! corechat is a token-authenticated chat backend: a REST API over a
//! SQLite store for users, conversations, messages, and notifications,
//! with a send-message orchestrator that debits credits and calls a
//! generative-language API (or a canned mock when no key is configured).
//!
//! # Module Structure
//!
//! - **`server`** - Configuration loading, application assembly, shared state
//! - **`routes`** - Router assembly and /api endpoint wiring
//! - **`auth`** - Token service, user store, register/login/refresh/me
//! - **`middleware`** - Bearer-token authentication, fixed-window rate limiting
//! - **`chat`** - Conversation and message stores, chat handlers, the
//!   send-message orchestrator
//! - **`ai`** - Response-generation collaborator (pass-through and mock)
//! - **`notifications`** - Notification store and handlers
//! - **`account`** - Profile and stats handlers
//! - **`realtime`** - Server-sent event fan-out for authenticated subscribers
//! - **`error`** - Error taxonomy and the `{message, code}` envelope
//! - **`validation`** - Request field validators
//!
//! # State Management
//!
//! Handlers share an `AppState` containing the store pool, the loaded
//! configuration, the response generator, the realtime broadcast channel,
//! and the rate limiter. The pool is the only cross-request state that
//! matters; everything else is configuration or fan-out plumbing.
//!
//! # Error Handling
//!
//! Every handler returns `Result<_, ApiError>`; the error type carries a
//! stable machine-readable code and renders as `{message, code}` with the
//! matching HTTP status.

/// Account surface (profile, stats)
pub mod account;

/// Response generation (pass-through and mock)
pub mod ai;

/// Authentication: tokens, users, handlers
pub mod auth;

/// Chat: conversations, messages, send orchestration
pub mod chat;

/// SQLite row codec helpers
pub mod db;

/// Error taxonomy and response envelope
pub mod error;

/// Request middleware (auth, rate limiting)
pub mod middleware;

/// Notifications store and handlers
pub mod notifications;

/// Real-time event fan-out
pub mod realtime;

/// Route configuration
pub mod routes;

/// Server setup and shared state
pub mod server;

/// Request field validation
pub mod validation;

pub use error::ApiError;
pub use routes::create_router;
pub use server::{create_app, AppConfig, AppState};
