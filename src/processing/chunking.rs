//! Character-budget chunking with overlap.
//!
//! Page text is split with `text-splitter`, which prefers paragraph breaks, then sentences,
//! words and finally grapheme clusters until every chunk fits the budget. Adjacent chunks share
//! up to `overlap` characters. Budgets are measured in characters and no chunk exceeds
//! `chunk_size`.

use text_splitter::{Characters, ChunkConfig, TextSplitter};

use super::types::{ChunkDraft, ChunkingError, PageText};

/// Split every page independently and tag each chunk with its page and source.
pub(crate) fn chunk_pages(
    source: &str,
    pages: &[PageText],
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<ChunkDraft>, ChunkingError> {
    let splitter = build_splitter(chunk_size, overlap)?;

    let mut drafts = Vec::new();
    for page in pages {
        for text in splitter.chunks(&page.text) {
            if text.trim().is_empty() {
                continue;
            }
            drafts.push(ChunkDraft {
                text: text.to_string(),
                source: source.to_string(),
                page: page.number,
            });
        }
    }
    Ok(drafts)
}

fn build_splitter(chunk_size: usize, overlap: usize) -> Result<TextSplitter<Characters>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    let too_large = ChunkingError::OverlapTooLarge {
        overlap,
        chunk_size,
    };
    if overlap >= chunk_size {
        return Err(too_large);
    }
    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|_| too_large)?;
    Ok(TextSplitter::new(config))
}
