//! Document processing pipeline: PDF loading, chunking, retrieval and answer orchestration.

pub mod chunking;
pub mod pdf;
mod service;
pub mod types;

pub use pdf::{DocumentLoader, PdfLoader};
pub use service::{
    AssistantApi, AssistantService, DEFAULT_QUIZ_QUESTIONS, NO_DOCUMENTS_ANSWER, RETRIEVAL_TOP_K,
    ServiceComponents,
};
pub use types::{
    ChunkDraft, ChunkingError, DocumentError, PageText, ProcessingError, UploadOutcome,
};
