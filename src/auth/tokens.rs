/**
 * Token Service
 *
 * This module issues and verifies the JWT pair used by the API: a 7-day
 * access token and a 30-day refresh token, both HS256-signed with the
 * configured secret. Refresh tokens carry a `token_type` marker so an
 * access token cannot be exchanged at the refresh endpoint.
 *
 * There is no revocation list: a leaked token stays valid until its natural
 * expiry, and a refresh exchange does not invalidate the prior pair.
 */

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access token lifetime.
pub const ACCESS_TOKEN_TTL_DAYS: i64 = 7;
/// Refresh token lifetime.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 30;
/// Type marker carried by refresh tokens.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Set to `"refresh"` on refresh tokens, absent on access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Whether these claims came from a refresh token.
    pub fn is_refresh(&self) -> bool {
        self.token_type.as_deref() == Some(REFRESH_TOKEN_TYPE)
    }

    /// Parse the subject back into a user id.
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::Malformed("subject is not a valid user id".into()))
    }
}

/// Classified verification failure.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("malformed token: {0}")]
    Malformed(String),
}

fn sign(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let key = EncodingKey::from_secret(secret.as_ref());
    encode(&Header::default(), claims, &key)
}

/// Issue a 7-day access token for a user.
pub fn issue_access_token(
    user_id: Uuid,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        token_type: None,
        iat: now.timestamp(),
        exp: (now + Duration::days(ACCESS_TOKEN_TTL_DAYS)).timestamp(),
    };
    sign(&claims, secret)
}

/// Issue a 30-day refresh token for a user.
pub fn issue_refresh_token(
    user_id: Uuid,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        token_type: Some(REFRESH_TOKEN_TYPE.to_string()),
        iat: now.timestamp(),
        exp: (now + Duration::days(REFRESH_TOKEN_TTL_DAYS)).timestamp(),
    };
    sign(&claims, secret)
}

/// Verify a token and decode its claims.
///
/// Expiry is distinguished from every other failure so callers can report
/// `TOKEN_EXPIRED` separately from `INVALID_TOKEN`.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::default();

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(TokenError::Expired),
            _ => Err(TokenError::Malformed(e.to_string())),
        },
    }
}
