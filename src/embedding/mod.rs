//! Embedding client abstraction and adapters.
//!
//! Two backends are available: the hosted Gemini `batchEmbedContents` API and a local
//! deterministic encoder that hashes bytes into a fixed-size vector. The local encoder keeps the
//! service usable offline and gives tests stable vectors.

use crate::config::{
    Config, ConfigError, EmbeddingProvider, GOOGLE_API_KEY_ENV, require_secret,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Gemini accepts at most this many requests per batch call.
const GEMINI_BATCH_LIMIT: usize = 100;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider credentials or settings were missing.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Provider could not be reached.
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
}

/// How the produced vectors will be used; providers may embed documents and queries differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// Chunk text stored in the vector store.
    Document,
    /// Question text used to search the store.
    Query,
}

impl EmbeddingTask {
    fn as_gemini_task_type(self) -> &'static str {
        match self {
            Self::Document => "RETRIEVAL_DOCUMENT",
            Self::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied text, in input order.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;

    /// Identifier of the model producing the vectors.
    fn model_name(&self) -> &str;
}

/// Deterministic local encoder that spreads text bytes across a fixed number of dimensions.
pub struct HashEmbeddingClient {
    dimension: usize,
}

impl HashEmbeddingClient {
    /// Construct a new encoder producing vectors of `dimension` floats.
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(text: &str, dimension: usize) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; dimension];

        let normalized = text.to_lowercase();
        for word in normalized.split_whitespace() {
            for (idx, byte) in word.bytes().enumerate() {
                let position = (usize::from(byte) * 31 + idx) % dimension;
                embedding[position] += f32::from(byte) / 255.0;
            }
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if self.dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        tracing::debug!(count = texts.len(), ?task, "Hashing embeddings locally");

        Ok(texts
            .iter()
            .map(|text| Self::encode(text, self.dimension))
            .collect())
    }

    fn model_name(&self) -> &str {
        "local-hash"
    }
}

/// Client for the Gemini embeddings REST API.
pub struct GeminiEmbeddingClient {
    http: Client,
    base_url: String,
    model: String,
    dimension: usize,
    api_key: Option<String>,
}

impl GeminiEmbeddingClient {
    /// Build a client from configuration. The API key is validated lazily on first use.
    pub fn new(config: &Config) -> Result<Self, EmbeddingClientError> {
        let http = Client::builder().user_agent("edu-assist/embed").build()?;
        Ok(Self {
            http,
            base_url: config.gemini_base_url.clone(),
            model: config.embedding_model.clone(),
            dimension: config.embedding_dimension,
            api_key: config.google_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:batchEmbedContents",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn qualified_model(&self) -> String {
        format!("models/{}", self.model)
    }

    async fn embed_batch(
        &self,
        api_key: &str,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let model = self.qualified_model();
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: model.clone(),
                    content: Content {
                        parts: vec![Part { text: text.clone() }],
                    },
                    task_type: task.as_gemini_task_type(),
                    output_dimensionality: Some(self.dimension),
                })
                .collect(),
        };

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
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "Gemini returned {status}: {body}"
            )));
        }

        let payload: BatchEmbedResponse = response.json().await?;
        if payload.embeddings.len() != texts.len() {
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "expected {} embeddings, received {}",
                texts.len(),
                payload.embeddings.len()
            )));
        }

        Ok(payload
            .embeddings
            .into_iter()
            .map(|embedding| embedding.values)
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingClient for GeminiEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let api_key = require_secret(self.api_key.as_deref(), GOOGLE_API_KEY_ENV)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            model = %self.model,
            dimension = self.dimension,
            count = texts.len(),
            ?task,
            "Requesting Gemini embeddings"
        );

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(GEMINI_BATCH_LIMIT) {
            vectors.extend(self.embed_batch(api_key, batch, task).await?);
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Build an embedding client suitable for the supplied configuration.
pub fn get_embedding_client(
    config: &Config,
) -> Result<Box<dyn EmbeddingClient>, EmbeddingClientError> {
    Ok(match config.embedding_provider {
        EmbeddingProvider::Gemini => Box::new(GeminiEmbeddingClient::new(config)?),
        EmbeddingProvider::Hash => Box::new(HashEmbeddingClient::new(config.embedding_dimension)),
    })
}
