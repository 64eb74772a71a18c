use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the assistant server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding the persisted vector store.
    pub vector_store_dir: PathBuf,
    /// Directory where uploads are staged while they are ingested.
    pub upload_dir: PathBuf,
    /// Gemini API key; checked when an embedding or LLM call is made.
    pub google_api_key: Option<String>,
    /// Scaledown API key; checked when a summary is requested.
    pub scaledown_api_key: Option<String>,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Generative model used for answers and quizzes.
    pub llm_model: String,
    /// Base URL of the Gemini REST API.
    pub gemini_base_url: String,
    /// Endpoint of the Scaledown compression API.
    pub scaledown_url: String,
    /// Maximum chunk length in characters.
    pub text_splitter_chunk_size: usize,
    /// Characters shared between adjacent chunks.
    pub text_splitter_chunk_overlap: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported embedding backends for the ingestion pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hosted Gemini embeddings API.
    Gemini,
    /// Local deterministic hashing encoder, useful offline.
    Hash,
}

pub(crate) const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(crate) const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub(crate) const SCALEDOWN_API_KEY_ENV: &str = "SCALEDOWN_API_KEY";
pub(crate) const DEFAULT_SCALEDOWN_URL: &str = "https://api.scaledown.xyz/compress/raw/";

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            vector_store_dir: load_env_optional("VECTOR_STORE_DIR")
                .unwrap_or_else(|| "./vector_db".to_string())
                .into(),
            upload_dir: load_env_optional("UPLOAD_DIR")
                .unwrap_or_else(|| "temp_uploads".to_string())
                .into(),
            google_api_key: load_env_optional(GOOGLE_API_KEY_ENV),
            scaledown_api_key: load_env_optional(SCALEDOWN_API_KEY_ENV),
            embedding_provider: load_env_optional("EMBEDDING_PROVIDER")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".into()))
                })
                .transpose()?
                .unwrap_or(EmbeddingProvider::Gemini),
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| "gemini-embedding-001".to_string()),
            embedding_dimension: parse_env("EMBEDDING_DIMENSION")?.unwrap_or(768),
            llm_model: load_env_optional("LLM_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            scaledown_url: load_env_optional("SCALEDOWN_URL")
                .unwrap_or_else(|| DEFAULT_SCALEDOWN_URL.to_string()),
            text_splitter_chunk_size: parse_env("TEXT_SPLITTER_CHUNK_SIZE")?.unwrap_or(1000),
            text_splitter_chunk_overlap: parse_env("TEXT_SPLITTER_CHUNK_OVERLAP")?
                .unwrap_or(100),
            server_port: parse_env("SERVER_PORT")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vector_store_dir: PathBuf::from("./vector_db"),
            upload_dir: PathBuf::from("temp_uploads"),
            google_api_key: None,
            scaledown_api_key: None,
            embedding_provider: EmbeddingProvider::Gemini,
            embedding_model: "gemini-embedding-001".into(),
            embedding_dimension: 768,
            llm_model: "gemini-2.5-flash".into(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
            scaledown_url: DEFAULT_SCALEDOWN_URL.into(),
            text_splitter_chunk_size: 1000,
            text_splitter_chunk_overlap: 100,
            server_port: None,
        }
    }
}

/// Return a secret that was read at startup, or report `key` as missing when it is unset or
/// blank. Clients call this right before the request that needs the secret.
pub(crate) fn require_secret<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, ConfigError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "hash" | "local" => Ok(Self::Hash),
            _ => Err(()),
        }
    }
}

/// Load `.env` (when present) and read the configuration from the environment.
pub fn init_config() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        vector_store_dir = %config.vector_store_dir.display(),
        upload_dir = %config.upload_dir.display(),
        server_port = ?config.server_port,
        embedding_provider = ?config.embedding_provider,
        embedding_model = %config.embedding_model,
        llm_model = %config.llm_model,
        has_google_api_key = config.google_api_key.is_some(),
        has_scaledown_api_key = config.scaledown_api_key.is_some(),
        "Loaded configuration"
    );
    Ok(config)
}
