//! PDF text extraction.
//!
//! `pdf-extract` returns the whole document as one string with form feeds between pages. The
//! parser is synchronous and can panic on malformed fonts, so it runs on the blocking pool and a
//! panic is reported as an extraction error.

use super::types::{DocumentError, PageText};
use async_trait::async_trait;
use std::path::Path;

/// Source of page text for the ingestion pipeline.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the document at `path` as numbered pages.
    async fn load(&self, path: &Path) -> Result<Vec<PageText>, DocumentError>;
}

/// [`DocumentLoader`] backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLoader;

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> Result<Vec<PageText>, DocumentError> {
        let path_label = path.display().to_string();
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocumentError::NotFound(path_label));
            }
            Err(source) => {
                return Err(DocumentError::Io {
                    path: path_label,
                    source,
                });
            }
        };

        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|error| error.to_string())
        })
        .await
        .map_err(|join_error| DocumentError::Extraction(format!("PDF parser aborted: {join_error}")))?
        .map_err(DocumentError::Extraction)?;

        let pages = split_pages(&text);
        if pages.is_empty() {
            tracing::warn!(path = %path_label, "No text extracted from PDF; it may be a scanned document");
        } else {
            tracing::debug!(path = %path_label, pages = pages.len(), "Extracted PDF text");
        }
        Ok(pages)
    }
}

/// Split extracted text on form feeds, numbering pages from 1 and keeping empty pages out.
///
/// Page numbers follow the physical page position, so blank pages still advance the counter.
pub(crate) fn split_pages(text: &str) -> Vec<PageText> {
    text.split('\x0c')
        .enumerate()
        .filter_map(|(index, page)| {
            let trimmed = page.trim();
            (!trimmed.is_empty()).then(|| PageText {
                number: index + 1,
                text: trimmed.to_string(),
            })
        })
        .collect()
}
