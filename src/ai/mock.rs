/**
 * Mock Generator
 *
 * Canned replies used when no generation API key is configured. A few
 * keyword matches give the demo a conversational feel; everything else
 * rotates through a fixed reply bank.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;

use super::{ChatTurn, GeneratedReply, GenerationSettings, GeneratorError, ResponseGenerator};

const FALLBACK_REPLIES: [&str; 5] = [
    "That's an interesting question! Let me help you with that.",
    "I understand what you're asking. Here's my perspective on this topic.",
    "Great question! This is a complex topic that requires careful consideration.",
    "I'd be happy to help you explore this further. Let me break it down for you.",
    "That's a thoughtful inquiry. Here's what I think about this subject.",
];

const MOCK_SUFFIX: &str = "This is a mock response. Configure an AI API key to \
                           get real generations based on the conversation context.";

/// Canned-reply generator.
pub struct MockGenerator {
    cursor: AtomicUsize,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }

    fn pick_reply(&self, content: &str) -> &'static str {
        let lower = content.to_lowercase();
        if lower.contains("hello") || lower.contains("hi") {
            return "Hello! I'm your AI assistant. How can I help you today?";
        }
        if lower.contains("how are you") {
            return "I'm doing well, thank you for asking! I'm here and ready to help \
                    you with any questions or tasks you might have.";
        }
        if lower.contains("thank") {
            return "You're very welcome! I'm glad I could help. Is there anything else \
                    you'd like to know?";
        }
        if lower.contains("help") {
            return "I'm here to help! You can ask me questions about various topics, \
                    get explanations, or request assistance with tasks.";
        }
        if lower.contains("code") || lower.contains("programming") {
            return "I can help you with programming questions! I can explain concepts, \
                    help debug code, or provide code examples.";
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % FALLBACK_REPLIES.len();
        FALLBACK_REPLIES[index]
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseGenerator for MockGenerator {
    async fn generate(
        &self,
        content: &str,
        _history: &[ChatTurn],
        _settings: &GenerationSettings,
    ) -> Result<GeneratedReply, GeneratorError> {
        let started = Instant::now();
        let reply = format!("{}\n\n{}", self.pick_reply(content), MOCK_SUFFIX);
        let tokens = ((reply.len() / 4) as i64).clamp(50, 150);

        Ok(GeneratedReply {
            content: reply,
            tokens,
            processing_time_ms: started.elapsed().as_millis() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> GenerationSettings {
        GenerationSettings {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    #[tokio::test]
    async fn test_greeting_keyword() {
        let generator = MockGenerator::new();
        let reply = generator
            .generate("hello there", &[], &settings())
            .await
            .unwrap();
        assert!(reply.content.starts_with("Hello!"));
        assert!(reply.tokens >= 50);
    }

    #[tokio::test]
    async fn test_fallback_rotation() {
        let generator = MockGenerator::new();
        let first = generator
            .generate("tell me about rust", &[], &settings())
            .await
            .unwrap();
        let second = generator
            .generate("tell me about rust", &[], &settings())
            .await
            .unwrap();
        // Successive fallback replies rotate through the bank
        assert_ne!(first.content, second.content);
    }

    #[tokio::test]
    async fn test_token_bounds() {
        let generator = MockGenerator::new();
        let reply = generator.generate("anything", &[], &settings()).await.unwrap();
        assert!((50..=150).contains(&reply.tokens));
    }
}
