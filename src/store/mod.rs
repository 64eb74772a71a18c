//! On-disk vector store.
//!
//! The store is a single directory holding a `manifest.json` (embedding model and dimension)
//! and an append-only `entries.jsonl` file with one serialized [`StoreEntry`] per line. Uploads
//! append, queries scan every entry with cosine similarity, and reset removes the directory.

pub mod disk;
pub mod entry;
pub mod types;

pub use disk::DiskVectorStore;
pub use entry::{build_entries, compute_chunk_hash, cosine_similarity};
pub use types::{ChunkMetadata, RetrievedChunk, StoreEntry, StoreError, StoreManifest, VectorStore};
