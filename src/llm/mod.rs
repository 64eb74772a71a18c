//! Generative model client used for answers and quizzes.
//!
//! The Gemini adapter talks to the `generateContent` REST endpoint directly with typed request
//! and response bodies. Prompt templates live in [`prompts`].

pub mod prompts;

use crate::config::{Config, ConfigError, GOOGLE_API_KEY_ENV, require_secret};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced while invoking the language model.
#[derive(Debug, Error)]
pub enum LlmClientError {
    /// Provider credentials were missing.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Provider could not be reached.
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response carried no usable text.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Single-turn completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Fully rendered prompt.
    pub prompt: String,
    /// Sampling temperature; `None` keeps the provider default.
    pub temperature: Option<f32>,
}

/// Interface implemented by language model providers.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run the prompt and return the generated text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmClientError>;
}

/// Client for the Gemini `generateContent` API.
pub struct GeminiLlmClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiLlmClient {
    /// Build a client from configuration. The API key is validated lazily on first use.
    pub fn new(config: &Config) -> Result<Self, LlmClientError> {
        let http = Client::builder().user_agent("edu-assist/llm").build()?;
        Ok(Self {
            http,
            base_url: config.gemini_base_url.clone(),
            model: config.llm_model.clone(),
            api_key: config.google_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        Some(text)
    }
}

#[async_trait]
impl LlmClient for GeminiLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmClientError> {
        let api_key = require_secret(self.api_key.as_deref(), GOOGLE_API_KEY_ENV)?;

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: request.prompt,
                }],
            }],
            generation_config: request
                .temperature
                .map(|temperature| GenerationConfig { temperature }),
        };

        tracing::debug!(model = %self.model, "Invoking Gemini generateContent");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmClientError::GenerationFailed(format!(
                "Gemini returned {status}: {body}"
            )));
        }

        let payload: GenerateContentResponse = response.json().await.map_err(|error| {
            LlmClientError::InvalidResponse(format!("failed to decode Gemini response: {error}"))
        })?;

        payload.into_text().ok_or_else(|| {
            LlmClientError::InvalidResponse("Gemini response contained no candidates".into())
        })
    }
}
