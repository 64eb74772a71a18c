//! Summaries through the Scaledown compression API.
//!
//! The assistant forwards raw text together with a fixed instruction and returns the compressed
//! prompt produced by Scaledown. The API key is checked on every call so a missing key surfaces
//! as a configuration error before any request is sent.

use crate::config::{Config, ConfigError, SCALEDOWN_API_KEY_ENV, require_secret};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Instruction sent alongside every summary request.
pub const SUMMARY_CONTEXT: &str =
    "Compress the following educational content into a high-yield summary.";

/// Errors surfaced while requesting a summary.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// API key or endpoint configuration was missing.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Provider could not be reached.
    #[error("Scaledown request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider answered with a non-200 status.
    #[error("Scaledown API error: {status} - {body}")]
    UnexpectedStatus {
        /// HTTP status code returned by Scaledown.
        status: u16,
        /// Response body returned with the status.
        body: String,
    },
    /// Provider reported that compression did not succeed.
    #[error("Scaledown API compression failed.")]
    CompressionFailed,
}

/// Interface implemented by summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Produce a condensed version of `text`.
    async fn summarize(&self, text: &str) -> Result<String, SummarizationClientError>;
}

/// Client for the Scaledown `compress/raw` endpoint.
pub struct ScaledownClient {
    http: Client,
    url: String,
    api_key: Option<String>,
}

impl ScaledownClient {
    /// Build a client from configuration.
    pub fn new(config: &Config) -> Result<Self, SummarizationClientError> {
        let http = Client::builder().user_agent("edu-assist/summary").build()?;
        Ok(Self {
            http,
            url: config.scaledown_url.clone(),
            api_key: config.scaledown_api_key.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct CompressRequest<'a> {
    context: &'a str,
    prompt: &'a str,
    scaledown: CompressOptions,
}

#[derive(Debug, Serialize)]
struct CompressOptions {
    rate: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompressResponse {
    #[serde(default)]
    successful: bool,
    #[serde(default)]
    compressed_prompt: Option<String>,
}

#[async_trait]
impl SummarizationClient for ScaledownClient {
    async fn summarize(&self, text: &str) -> Result<String, SummarizationClientError> {
        let api_key = require_secret(self.api_key.as_deref(), SCALEDOWN_API_KEY_ENV)?;

        let payload = CompressRequest {
            context: SUMMARY_CONTEXT,
            prompt: text,
            scaledown: CompressOptions { rate: "auto" },
        };

        tracing::debug!(chars = text.chars().count(), "Requesting Scaledown compression");
        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::UnexpectedStatus { status, body });
        }

        let result: CompressResponse = response.json().await?;
        if !result.successful {
            return Err(SummarizationClientError::CompressionFailed);
        }

        Ok(result.compressed_prompt.unwrap_or_default())
    }
}
