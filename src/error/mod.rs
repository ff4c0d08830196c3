/**
 * Backend Error Types
 *
 * This module defines the error taxonomy for the API surface. Every error
 * that leaves a handler is an `ApiError`, which renders as the
 * `{message, code}` JSON envelope with the matching HTTP status.
 */

pub mod types;

pub use types::{ApiError, AuthFailure, FieldError, Resource};
