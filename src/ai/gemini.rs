/**
 * Gemini Pass-Through Generator
 *
 * Direct call to the generative-language `generateContent` endpoint. The
 * conversation window is mapped to alternating user/model parts and the
 * conversation settings drive the generation config. No retry and no
 * request timeout beyond reqwest's defaults; a failed call surfaces as a
 * `GeneratorError` for the orchestrator to handle.
 */

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    estimate_tokens, ChatTurn, GeneratedReply, GenerationSettings, GeneratorError,
    ResponseGenerator,
};

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: i64,
    top_p: f64,
    top_k: i64,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    candidates_token_count: Option<i64>,
}

/// Pass-through generator for the generative-language API.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    fn build_request(
        content: &str,
        history: &[ChatTurn],
        settings: &GenerationSettings,
    ) -> GeminiRequest {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|turn| Content {
                // The API knows "user" and "model"; system turns ride along as user
                role: if turn.role == "assistant" {
                    "model".to_string()
                } else {
                    "user".to_string()
                },
                parts: vec![Part {
                    text: turn.content.clone(),
                }],
            })
            .collect();

        contents.push(Content {
            role: "user".to_string(),
            parts: vec![Part {
                text: content.to_string(),
            }],
        });

        GeminiRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: settings.temperature,
                max_output_tokens: settings.max_tokens,
                top_p: 0.8,
                top_k: 10,
            },
        }
    }
}

#[async_trait]
impl ResponseGenerator for GeminiGenerator {
    async fn generate(
        &self,
        content: &str,
        history: &[ChatTurn],
        settings: &GenerationSettings,
    ) -> Result<GeneratedReply, GeneratorError> {
        let started = Instant::now();
        let request = Self::build_request(content, history, settings);

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Generation API returned {}: {}", status, detail);
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let body: GeminiResponse = response.json().await?;
        let text = body
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.clone())
            .ok_or(GeneratorError::InvalidResponse)?;

        let tokens = body
            .usage_metadata
            .and_then(|usage| usage.candidates_token_count)
            .unwrap_or_else(|| estimate_tokens(&text));

        Ok(GeneratedReply {
            content: text,
            tokens,
            processing_time_ms: started.elapsed().as_millis() as i64,
        })
    }
}
