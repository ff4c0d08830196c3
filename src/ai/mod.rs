/**
 * Response Generation
 *
 * The send-message path hands the latest user utterance, a bounded window
 * of prior turns, and the conversation's generation settings to a
 * `ResponseGenerator`. Two implementations exist:
 *
 * - `GeminiGenerator` - direct pass-through to the generative-language API
 * - `MockGenerator` - canned replies, used when no API key is configured
 *
 * A generator failure is an error value, never a panic; the caller decides
 * how to unwind the writes it made before the call.
 */

use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;
pub mod mock;

pub use gemini::GeminiGenerator;
pub use mock::MockGenerator;

/// Number of trailing conversation turns included as generation context.
pub const HISTORY_WINDOW: usize = 10;

/// One prior conversation turn handed to the generator as context.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// "user", "assistant", or "system"
    pub role: String,
    pub content: String,
}

/// Generation settings carried by the conversation.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i64,
}

/// Reply produced by a generator.
#[derive(Debug, Clone)]
pub struct GeneratedReply {
    pub content: String,
    /// Token count reported by the API, or an estimate for the mock
    pub tokens: i64,
    /// Wall-clock time spent producing the reply
    pub processing_time_ms: i64,
}

/// Failure from the response-generation collaborator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("request to generation API failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("generation API returned status {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("generation API returned an unexpected response shape")]
    InvalidResponse,
}

/// The response-generation collaborator.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generate a reply to `content` given the trailing conversation window.
    async fn generate(
        &self,
        content: &str,
        history: &[ChatTurn],
        settings: &GenerationSettings,
    ) -> Result<GeneratedReply, GeneratorError>;
}

/// Rough token estimate for replies whose API reported no usage metadata.
pub(crate) fn estimate_tokens(text: &str) -> i64 {
    (text.len() / 4).max(1) as i64
}
