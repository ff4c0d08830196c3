/**
 * Server Configuration
 *
 * This module loads server configuration from environment variables
 * (optionally via a `.env` file loaded by the binary).
 *
 * # Mandatory values
 *
 * `JWT_SECRET` has no default. Falling back to a baked-in signing secret
 * would make every deployment that forgot to set one forge-able, so a
 * missing or empty secret is a startup error, not a warning.
 *
 * # Optional values
 *
 * Everything else has a default and, as with the upstream services this
 * mirrors, unparseable numeric values silently fall back to the default.
 */

use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;

/// Default Gemini endpoint, keyed by model name.
const GEMINI_API_URL_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Default generation model.
const DEFAULT_AI_MODEL: &str = "gemini-1.5-flash";

static DEV_MODE: OnceLock<bool> = OnceLock::new();

/// Whether the server runs in development mode (`APP_ENV=development`).
///
/// Development mode includes error detail in 500 response bodies; outside
/// it the detail stays in the server log.
pub fn development_mode() -> bool {
    *DEV_MODE.get().unwrap_or(&false)
}

fn set_development_mode(enabled: bool) {
    let _ = DEV_MODE.set(enabled);
}

/// Configuration error raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set; refusing to start without an explicit signing secret")]
    MissingJwtSecret,
}

/// Settings for the response-generation collaborator.
#[derive(Debug, Clone)]
pub struct AiSettings {
    /// API key for the generative-language API; the mock generator is used
    /// when this is absent
    pub api_key: Option<String>,
    /// Full generateContent endpoint URL
    pub api_url: String,
    /// Model name, used to build the default endpoint URL
    pub model: String,
}

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port
    pub port: u16,
    /// SQLite connection string
    pub database_url: String,
    /// HS256 signing secret for access and refresh tokens
    pub jwt_secret: String,
    /// Fixed-window length for the per-IP rate limiter
    pub rate_limit_window: Duration,
    /// Request cap per IP per window
    pub rate_limit_max: u32,
    /// Response generator settings
    pub ai: AiSettings,
    /// Development mode flag
    pub development: bool,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or(ConfigError::MissingJwtSecret)?;

        let model = std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.to_string());
        let api_url = std::env::var("AI_API_URL")
            .unwrap_or_else(|_| format!("{GEMINI_API_URL_BASE}/{model}:generateContent"));
        let api_key = std::env::var("AI_API_KEY").ok().filter(|key| !key.is_empty());

        let development = std::env::var("APP_ENV").as_deref() == Ok("development");
        set_development_mode(development);

        Ok(Self {
            port: env_or("SERVER_PORT", 5000),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://corechat.db?mode=rwc".to_string()),
            jwt_secret,
            rate_limit_window: Duration::from_millis(env_or("RATE_LIMIT_WINDOW_MS", 900_000)),
            rate_limit_max: env_or("RATE_LIMIT_MAX_REQUESTS", 100),
            ai: AiSettings {
                api_key,
                api_url,
                model,
            },
            development,
        })
    }
}

/// Read an environment variable, falling back to `default` when the
/// variable is unset or does not parse.
fn env_or<T: FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
