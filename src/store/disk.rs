//! Directory-backed [`VectorStore`] implementation.

use crate::store::entry::cosine_similarity;
use crate::store::types::{RetrievedChunk, StoreEntry, StoreError, StoreManifest, VectorStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;

const MANIFEST_FILE: &str = "manifest.json";
const ENTRIES_FILE: &str = "entries.jsonl";
const LAYOUT_VERSION: u32 = 1;

/// Vector store persisted as JSON files inside a single directory.
///
/// File operations from this process are serialized through an internal lock. Separate
/// processes sharing the directory are not coordinated.
pub struct DiskVectorStore {
    dir: PathBuf,
    lock: RwLock<()>,
}

impl DiskVectorStore {
    /// Open a store rooted at `dir`. Nothing is created until the first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: RwLock::new(()),
        }
    }

    /// Directory holding the persisted store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn entries_path(&self) -> PathBuf {
        self.dir.join(ENTRIES_FILE)
    }

    async fn read_manifest(&self) -> Result<Option<StoreManifest>, StoreError> {
        match fs::read(self.manifest_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn ensure_manifest(
        &self,
        embedding_model: &str,
        dimension: usize,
    ) -> Result<StoreManifest, StoreError> {
        if let Some(manifest) = self.read_manifest().await? {
            if manifest.embedding_model != embedding_model {
                tracing::warn!(
                    stored = %manifest.embedding_model,
                    requested = embedding_model,
                    "Appending vectors from a different embedding model"
                );
            }
            return Ok(manifest);
        }

        fs::create_dir_all(&self.dir).await?;
        let manifest = StoreManifest {
            version: LAYOUT_VERSION,
            embedding_model: embedding_model.to_string(),
            dimension,
        };
        fs::write(self.manifest_path(), serde_json::to_vec_pretty(&manifest)?).await?;
        tracing::debug!(dir = %self.dir.display(), dimension, "Created vector store");
        Ok(manifest)
    }

    /// Visit every stored entry in insertion order.
    async fn scan<F>(&self, mut visit: F) -> Result<(), StoreError>
    where
        F: FnMut(StoreEntry),
    {
        let file = match fs::File::open(self.entries_path()).await {
            Ok(file) => file,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(error.into()),
        };

        let mut lines = BufReader::new(file).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            visit(serde_json::from_str(&line)?);
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for DiskVectorStore {
    async fn append(
        &self,
        entries: Vec<StoreEntry>,
        embedding_model: &str,
    ) -> Result<usize, StoreError> {
        let Some(first) = entries.first() else {
            return Ok(0);
        };
        let _guard = self.lock.write().await;

        let manifest = self
            .ensure_manifest(embedding_model, first.embedding.len())
            .await?;
        if let Some(entry) = entries
            .iter()
            .find(|entry| entry.embedding.len() != manifest.dimension)
        {
            return Err(StoreError::DimensionMismatch {
                expected: manifest.dimension,
                actual: entry.embedding.len(),
            });
        }

        let mut buffer = Vec::new();
        for entry in &entries {
            serde_json::to_writer(&mut buffer, entry)?;
            buffer.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.entries_path())
            .await?;
        file.write_all(&buffer).await?;
        file.flush().await?;

        tracing::debug!(dir = %self.dir.display(), appended = entries.len(), "Appended entries");
        Ok(entries.len())
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, StoreError> {
        let _guard = self.lock.read().await;
        let Some(manifest) = self.read_manifest().await? else {
            return Ok(Vec::new());
        };
        if query.len() != manifest.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: manifest.dimension,
                actual: query.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<RetrievedChunk> = Vec::new();
        self.scan(|entry| {
            ranked.push(RetrievedChunk {
                score: cosine_similarity(query, &entry.embedding),
                text: entry.text,
                metadata: entry.metadata,
            });
        })
        .await?;

        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_k);
        Ok(ranked)
    }

    async fn is_empty(&self) -> Result<bool, StoreError> {
        let _guard = self.lock.read().await;
        match fs::metadata(self.entries_path()).await {
            Ok(metadata) => Ok(metadata.len() == 0),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(true),
            Err(error) => Err(error.into()),
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.read().await;
        let mut total = 0;
        self.scan(|_| total += 1).await?;
        Ok(total)
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        let _guard = self.lock.write().await;
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                tracing::info!(dir = %self.dir.display(), "Vector store removed");
                Ok(true)
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error.into()),
        }
    }
}
