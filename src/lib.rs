#![deny(missing_docs)]

//! Core library for the Educational Content Assistant server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Generative model client and prompt templates.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion and query metrics helpers.
pub mod metrics;
/// Document processing pipeline utilities.
pub mod processing;
/// On-disk vector store.
pub mod store;
/// Text summarization client abstraction.
pub mod summarization;
