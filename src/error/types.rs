/**
 * API Error Taxonomy
 *
 * This module defines the error types returned by route handlers and
 * middleware, and their mapping to HTTP responses.
 *
 * # Response Shape
 *
 * Every error renders as `{"message": ..., "code": ...}` where `code` is a
 * stable machine-readable string. Validation failures additionally carry an
 * `errors` array of field-level entries. Internal errors include an `error`
 * detail field only in development mode; outside it the detail stays in the
 * server log.
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::server::config::development_mode;

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Name of the offending request field
    pub field: &'static str,
    /// Human-readable description of the rule that failed
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Classified bearer-token failures produced by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No Authorization header / bearer token on the request
    NoToken,
    /// Token present but signature or format invalid
    InvalidToken,
    /// Token was valid once but has expired
    Expired,
    /// Token resolved to a missing or deactivated user
    InvalidUser,
}

impl AuthFailure {
    pub const fn code(self) -> &'static str {
        match self {
            Self::NoToken => "NO_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Expired => "TOKEN_EXPIRED",
            Self::InvalidUser => "INVALID_USER",
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::NoToken => "Access token required",
            Self::InvalidToken => "Invalid token",
            Self::Expired => "Token expired",
            Self::InvalidUser => "Invalid or inactive user",
        }
    }
}

/// Resources that route handlers can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Conversation,
    Notification,
    User,
    Route,
}

impl Resource {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Conversation => "CONVERSATION_NOT_FOUND",
            Self::Notification => "NOTIFICATION_NOT_FOUND",
            Self::User => "USER_NOT_FOUND",
            Self::Route => "ROUTE_NOT_FOUND",
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::Conversation => "Conversation not found",
            Self::Notification => "Notification not found",
            Self::User => "User not found",
            Self::Route => "Route not found",
        }
    }
}

/// All errors a handler can surface to a client.
///
/// Variants carry no sensitive data; internal detail is logged at the
/// construction site and only echoed to the client in development mode.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bearer-token failure from the auth middleware (401)
    #[error("{}", .0.message())]
    Auth(AuthFailure),

    /// Unknown username or wrong password; one message for both so the
    /// response does not reveal which usernames exist (401)
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Login against a deactivated account (401)
    #[error("Account is deactivated")]
    AccountDeactivated,

    /// Refresh request without a refresh token (401)
    #[error("Refresh token required")]
    MissingRefreshToken,

    /// Refresh token invalid, expired, or missing the refresh type marker (401)
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Registration with an already-taken username (409)
    #[error("Username already taken")]
    UserExists,

    /// Profile update to a username held by another user (409)
    #[error("Username already taken")]
    UsernameTaken,

    /// One or more request fields failed validation (400)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Conversation rename with an empty title (400)
    #[error("Title is required")]
    InvalidTitle,

    /// Referenced resource does not exist or is not visible to the caller (404)
    #[error("{}", .0.message())]
    NotFound(Resource),

    /// Send-message attempted with a zero credit balance (402)
    #[error("Insufficient credits")]
    InsufficientCredits,

    /// Fixed-window rate limit tripped (429)
    #[error("Too many requests from this IP, please try again later.")]
    RateLimited,

    /// Unclassified server-side failure; `code` is route-specific (500)
    #[error("{message}")]
    Internal {
        code: &'static str,
        message: &'static str,
        detail: Option<String>,
    },
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        Self::Auth(failure)
    }
}

impl ApiError {
    /// Build an internal error with a route-specific code.
    ///
    /// The underlying cause is logged here and kept out of the response
    /// body unless development mode is on.
    pub fn internal(
        code: &'static str,
        message: &'static str,
        cause: impl std::fmt::Display,
    ) -> Self {
        let detail = cause.to_string();
        tracing::error!("{}: {}", code, detail);
        Self::Internal {
            code,
            message,
            detail: Some(detail),
        }
    }

    /// Conversation/notification/user lookup failed.
    pub const fn not_found(resource: Resource) -> Self {
        Self::NotFound(resource)
    }

    /// Get the HTTP status code for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Auth(_)
            | Self::InvalidCredentials
            | Self::AccountDeactivated
            | Self::MissingRefreshToken
            | Self::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            Self::UserExists | Self::UsernameTaken => StatusCode::CONFLICT,
            Self::Validation(_) | Self::InvalidTitle => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the stable machine-readable code for this error.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Auth(failure) => failure.code(),
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            Self::MissingRefreshToken => "NO_REFRESH_TOKEN",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::UserExists => "USER_EXISTS",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidTitle => "INVALID_TITLE",
            Self::NotFound(resource) => resource.code(),
            Self::InsufficientCredits => "INSUFFICIENT_CREDITS",
            Self::RateLimited => "RATE_LIMIT_EXCEEDED",
            Self::Internal { code, .. } => *code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "message": self.to_string(),
            "code": self.code(),
        });

        match &self {
            ApiError::Validation(errors) => {
                body["errors"] = json!(errors);
            }
            ApiError::Internal {
                detail: Some(detail),
                ..
            } if development_mode() => {
                body["error"] = json!(detail);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}
