//! Shared types used by the vector store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while reading or writing the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("Vector store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Entry or manifest could not be encoded or decoded.
    #[error("Vector store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A vector did not match the dimension recorded in the manifest.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension recorded when the store was created.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
}

/// Metadata persisted with every chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Name of the uploaded file the chunk came from.
    pub source: String,
    /// 1-based page number within the source document.
    pub page: usize,
    /// Position of the chunk within the upload.
    pub chunk_index: usize,
    /// SHA-256 digest of the chunk text.
    pub chunk_hash: String,
    /// RFC 3339 timestamp of ingestion.
    pub indexed_at: String,
}

/// One persisted `(text, embedding, metadata)` triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreEntry {
    /// Identifier assigned at ingestion.
    pub id: String,
    /// Chunk text.
    pub text: String,
    /// Embedding vector produced for the chunk.
    pub embedding: Vec<f32>,
    /// Provenance metadata.
    pub metadata: ChunkMetadata,
}

/// Store-level description written when the directory is first populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreManifest {
    /// Layout version of the directory.
    pub version: u32,
    /// Embedding model that produced the stored vectors.
    pub embedding_model: String,
    /// Length of every stored vector.
    pub dimension: usize,
}

/// A stored chunk returned by a similarity search.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// Chunk text.
    pub text: String,
    /// Cosine similarity between the query and the chunk.
    pub score: f32,
    /// Provenance metadata.
    pub metadata: ChunkMetadata,
}

/// Persistence layer indexing embeddings for nearest-neighbor retrieval.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append entries produced by `embedding_model`; returns the number written.
    async fn append(
        &self,
        entries: Vec<StoreEntry>,
        embedding_model: &str,
    ) -> Result<usize, StoreError>;

    /// Return up to `top_k` entries ranked by cosine similarity to `query`.
    async fn similarity_search(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError>;

    /// Whether the store holds no entries, including when it does not exist yet.
    async fn is_empty(&self) -> Result<bool, StoreError>;

    /// Number of stored entries; zero when the store does not exist.
    async fn count(&self) -> Result<usize, StoreError>;

    /// Remove every entry. Returns whether anything was deleted.
    async fn clear(&self) -> Result<bool, StoreError>;
}
