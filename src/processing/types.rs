//! Core data types and error definitions for the processing pipeline.

use crate::{
    config::ConfigError, embedding::EmbeddingClientError, llm::LlmClientError,
    store::StoreError, summarization::SummarizationClientError,
};
use thiserror::Error;

/// Errors produced while turning page text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Ingestion configured an impossible character budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would consume the whole chunk.
    #[error("chunk overlap {overlap} must be smaller than chunk size {chunk_size}")]
    OverlapTooLarge {
        /// Configured overlap.
        overlap: usize,
        /// Configured chunk size.
        chunk_size: usize,
    },
}

/// Errors raised while loading a document from disk.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The staged upload disappeared before it could be read.
    #[error("File not found: {0}")]
    NotFound(String),
    /// Reading the file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The PDF parser rejected the document.
    #[error("Failed to extract text from PDF: {0}")]
    Extraction(String),
}

/// Errors emitted by the assistant pipeline. The HTTP layer renders every variant as a 500.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Required configuration was missing at the point of use.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Document could not be loaded.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Chunking step failed to segment the document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Document produced no chunks worth indexing.
    #[error("No extractable text found in {0}")]
    EmptyDocument(String),
    /// Embedding provider failed to produce vectors.
    #[error("{0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Embedding provider returned the wrong number of vectors.
    #[error("Embedding provider returned {actual} vectors for {expected} inputs")]
    EmbeddingCountMismatch {
        /// Number of texts sent.
        expected: usize,
        /// Number of vectors received.
        actual: usize,
    },
    /// Vector store read or write failed.
    #[error("{0}")]
    Store(#[from] StoreError),
    /// Language model call failed.
    #[error("{0}")]
    Llm(#[from] LlmClientError),
    /// Summarization provider call failed.
    #[error("{0}")]
    Summarization(#[from] SummarizationClientError),
    /// Staging the upload on disk failed.
    #[error("Failed to stage upload: {0}")]
    Upload(#[source] std::io::Error),
}

impl ProcessingError {
    /// Whether the failure stems from missing configuration, including nested provider errors.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Embedding(EmbeddingClientError::Config(_))
                | Self::Llm(LlmClientError::Config(_))
                | Self::Summarization(SummarizationClientError::Config(_))
        )
    }
}

/// Text of one page, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: usize,
    /// Extracted page text.
    pub text: String,
}

/// A chunk awaiting embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDraft {
    /// Chunk text.
    pub text: String,
    /// Name of the source file.
    pub source: String,
    /// 1-based page number.
    pub page: usize,
}

/// Summary of a completed upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Number of chunks produced and stored for the document.
    pub chunks_count: usize,
}
