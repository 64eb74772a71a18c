//! Helpers for building and scoring store entries.

use crate::store::types::{ChunkMetadata, StoreEntry};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Pair chunk drafts with their vectors and attach identifiers and provenance.
///
/// `chunks` yields `(text, source, page)`; vectors are matched positionally.
pub fn build_entries<I>(chunks: I, vectors: Vec<Vec<f32>>) -> Vec<StoreEntry>
where
    I: IntoIterator<Item = (String, String, usize)>,
{
    let indexed_at = current_timestamp_rfc3339();
    chunks
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(chunk_index, ((text, source, page), embedding))| StoreEntry {
            id: Uuid::new_v4().to_string(),
            metadata: ChunkMetadata {
                source,
                page,
                chunk_index,
                chunk_hash: compute_chunk_hash(&text),
                indexed_at: indexed_at.clone(),
            },
            text,
            embedding,
        })
        .collect()
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Cosine similarity in `[-1, 1]`; zero for empty, mismatched or zero-norm vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
