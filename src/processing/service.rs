//! Assistant service coordinating ingestion, retrieval, answering and summarization.

use crate::{
    config::Config,
    embedding::{EmbeddingClient, EmbeddingTask, get_embedding_client},
    llm::{
        CompletionRequest, GeminiLlmClient, LlmClient,
        prompts::{render_answer_prompt, render_quiz_prompt},
    },
    metrics::{AssistantMetrics, MetricsSnapshot},
    processing::{
        chunking::chunk_pages,
        pdf::{DocumentLoader, PdfLoader},
        types::{ChunkDraft, ProcessingError, UploadOutcome},
    },
    store::{DiskVectorStore, RetrievedChunk, VectorStore, build_entries},
    summarization::{ScaledownClient, SummarizationClient},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Number of passages retrieved for every question.
pub const RETRIEVAL_TOP_K: usize = 5;
/// Question count used by [`AssistantService::generate_quiz`] callers that have no preference.
pub const DEFAULT_QUIZ_QUESTIONS: usize = 5;
/// Answer returned when nothing has been indexed yet.
pub const NO_DOCUMENTS_ANSWER: &str = "I don't know. No documents have been uploaded yet.";

const ANSWER_TEMPERATURE: f32 = 0.7;
const QUIZ_TEMPERATURE: f32 = 0.3;
const FALLBACK_UPLOAD_NAME: &str = "upload.pdf";

/// Pluggable collaborators used by [`AssistantService`].
pub struct ServiceComponents {
    /// Produces vectors for chunks and questions.
    pub embedding_client: Box<dyn EmbeddingClient>,
    /// Generates answers and quizzes.
    pub llm_client: Box<dyn LlmClient>,
    /// Produces summaries.
    pub summarization_client: Box<dyn SummarizationClient>,
    /// Turns staged uploads into page text.
    pub document_loader: Box<dyn DocumentLoader>,
}

/// Coordinates the upload, query, summary and reset pipelines.
///
/// The service owns the provider clients, the on-disk store rooted at
/// [`Config::vector_store_dir`], and the metrics counters. Build it once at startup and share it
/// through an `Arc`.
pub struct AssistantService {
    config: Config,
    embedding_client: Box<dyn EmbeddingClient>,
    llm_client: Box<dyn LlmClient>,
    summarization_client: Box<dyn SummarizationClient>,
    document_loader: Box<dyn DocumentLoader>,
    store: DiskVectorStore,
    metrics: AssistantMetrics,
}

/// Abstraction over the assistant pipelines used by the HTTP surface.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Stage, ingest and index an uploaded document.
    async fn upload_document(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadOutcome, ProcessingError>;

    /// Answer a question from the indexed passages.
    async fn answer_question(&self, question: &str) -> Result<String, ProcessingError>;

    /// Summarize raw text through the compression provider.
    async fn summarize(&self, text: &str) -> Result<String, ProcessingError>;

    /// Delete every indexed passage.
    async fn reset(&self) -> Result<(), ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl AssistantService {
    /// Build a service with the providers selected by `config`.
    pub fn new(config: Config) -> Result<Self, ProcessingError> {
        tracing::info!(provider = ?config.embedding_provider, "Initializing embedding client");
        let components = ServiceComponents {
            embedding_client: get_embedding_client(&config)?,
            llm_client: Box::new(GeminiLlmClient::new(&config)?),
            summarization_client: Box::new(ScaledownClient::new(&config)?),
            document_loader: Box::new(PdfLoader),
        };
        Ok(Self::with_components(config, components))
    }

    /// Build a service from explicit collaborators.
    pub fn with_components(config: Config, components: ServiceComponents) -> Self {
        let store = DiskVectorStore::new(config.vector_store_dir.clone());
        tracing::debug!(store = %store.dir().display(), "Vector store configured");
        Self {
            config,
            embedding_client: components.embedding_client,
            llm_client: components.llm_client,
            summarization_client: components.summarization_client,
            document_loader: components.document_loader,
            store,
            metrics: AssistantMetrics::new(),
        }
    }

    /// Load a document from disk and split it into chunks tagged with `source`.
    pub async fn ingest_document(
        &self,
        path: &Path,
        source: &str,
    ) -> Result<Vec<ChunkDraft>, ProcessingError> {
        let pages = self.document_loader.load(path).await?;
        let chunks = chunk_pages(
            source,
            &pages,
            self.config.text_splitter_chunk_size,
            self.config.text_splitter_chunk_overlap,
        )?;
        if chunks.is_empty() {
            return Err(ProcessingError::EmptyDocument(source.to_string()));
        }
        tracing::debug!(
            source,
            pages = pages.len(),
            chunks = chunks.len(),
            "Document split into chunks"
        );
        Ok(chunks)
    }

    /// Embed chunks and append them to the store. Nothing is written unless every embedding
    /// succeeds.
    pub async fn store_chunks(&self, chunks: Vec<ChunkDraft>) -> Result<usize, ProcessingError> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self
            .embedding_client
            .generate_embeddings(texts, EmbeddingTask::Document)
            .await?;
        if vectors.len() != chunks.len() {
            return Err(ProcessingError::EmbeddingCountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        let entries = build_entries(
            chunks
                .into_iter()
                .map(|chunk| (chunk.text, chunk.source, chunk.page)),
            vectors,
        );
        let written = self
            .store
            .append(entries, self.embedding_client.model_name())
            .await?;
        Ok(written)
    }

    /// Stage an upload on disk, ingest it, and remove the staged copy.
    pub async fn upload_document(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadOutcome, ProcessingError> {
        let source = sanitize_file_name(file_name);
        let staged = self.stage_upload(&source, &contents).await?;

        let result = async {
            let chunks = self.ingest_document(&staged, &source).await?;
            let chunk_count = chunks.len();
            self.store_chunks(chunks).await?;
            Ok::<_, ProcessingError>(chunk_count)
        }
        .await;

        if let Err(error) = tokio::fs::remove_file(&staged).await {
            tracing::warn!(path = %staged.display(), error = %error, "Failed to remove staged upload");
        }

        let chunks_count = result?;
        self.metrics.record_document(chunks_count as u64);
        tracing::info!(source = %source, chunks = chunks_count, "Document indexed");
        Ok(UploadOutcome { chunks_count })
    }

    async fn stage_upload(&self, source: &str, contents: &[u8]) -> Result<PathBuf, ProcessingError> {
        tokio::fs::create_dir_all(&self.config.upload_dir)
            .await
            .map_err(ProcessingError::Upload)?;
        let path = self
            .config
            .upload_dir
            .join(format!("{}-{source}", Uuid::new_v4()));
        tokio::fs::write(&path, contents)
            .await
            .map_err(ProcessingError::Upload)?;
        Ok(path)
    }

    /// Return the passages most similar to `question`, at most [`RETRIEVAL_TOP_K`].
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>, ProcessingError> {
        if self.store.is_empty().await? {
            return Ok(Vec::new());
        }

        let mut vectors = self
            .embedding_client
            .generate_embeddings(vec![question.to_string()], EmbeddingTask::Query)
            .await?;
        if vectors.len() != 1 {
            return Err(ProcessingError::EmbeddingCountMismatch {
                expected: 1,
                actual: vectors.len(),
            });
        }
        let vector = vectors.swap_remove(0);

        Ok(self
            .store
            .similarity_search(&vector, RETRIEVAL_TOP_K)
            .await?)
    }

    /// Answer a question by stuffing the retrieved passages into the answer prompt.
    pub async fn answer_question(&self, question: &str) -> Result<String, ProcessingError> {
        let passages = self.retrieve(question).await?;
        if passages.is_empty() {
            tracing::info!("Question received with an empty store");
            return Ok(NO_DOCUMENTS_ANSWER.to_string());
        }

        let texts: Vec<&str> = passages.iter().map(|passage| passage.text.as_str()).collect();
        let prompt = render_answer_prompt(&texts, question);
        let answer = self
            .llm_client
            .complete(CompletionRequest {
                prompt,
                temperature: Some(ANSWER_TEMPERATURE),
            })
            .await?;

        self.metrics.record_question();
        tracing::info!(
            retrieved = passages.len(),
            top_score = passages[0].score,
            "Question answered"
        );
        Ok(answer)
    }

    /// Summarize raw text through the compression provider.
    pub async fn summarize(&self, text: &str) -> Result<String, ProcessingError> {
        Ok(self.summarization_client.summarize(text).await?)
    }

    /// Generate a multiple-choice quiz as raw JSON text, exactly as the model returned it.
    pub async fn generate_quiz(
        &self,
        text: &str,
        num_questions: usize,
    ) -> Result<String, ProcessingError> {
        let prompt = render_quiz_prompt(text, num_questions);
        Ok(self
            .llm_client
            .complete(CompletionRequest {
                prompt,
                temperature: Some(QUIZ_TEMPERATURE),
            })
            .await?)
    }

    /// Remove the persisted store. Succeeds when the store is already absent.
    pub async fn reset(&self) -> Result<(), ProcessingError> {
        let removed = self.store.clear().await?;
        tracing::info!(removed, "Vector store reset");
        Ok(())
    }

    /// Number of entries currently persisted.
    pub async fn indexed_chunks(&self) -> Result<usize, ProcessingError> {
        Ok(self.store.count().await?)
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Reduce a client-supplied file name to a safe single path component.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_UPLOAD_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl AssistantApi for AssistantService {
    async fn upload_document(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadOutcome, ProcessingError> {
        AssistantService::upload_document(self, file_name, contents).await
    }

    async fn answer_question(&self, question: &str) -> Result<String, ProcessingError> {
        AssistantService::answer_question(self, question).await
    }

    async fn summarize(&self, text: &str) -> Result<String, ProcessingError> {
        AssistantService::summarize(self, text).await
    }

    async fn reset(&self) -> Result<(), ProcessingError> {
        AssistantService::reset(self).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        AssistantService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbeddingClient;
    use crate::llm::LlmClientError;
    use crate::processing::types::{DocumentError, PageText};
    use crate::summarization::SummarizationClientError;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    /// Returns the fixed pages regardless of the path.
    struct FixedLoader(Vec<PageText>);

    #[async_trait]
    impl DocumentLoader for FixedLoader {
        async fn load(&self, path: &Path) -> Result<Vec<PageText>, DocumentError> {
            if !path.exists() {
                return Err(DocumentError::NotFound(path.display().to_string()));
            }
            Ok(self.0.clone())
        }
    }

    /// Answers with the context block of the prompt so tests can see what was retrieved.
    #[derive(Clone, Default)]
    struct EchoContextLlm {
        prompts: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    #[async_trait]
    impl LlmClient for EchoContextLlm {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmClientError> {
            self.prompts.lock().await.push(request.clone());
            let context = request
                .prompt
                .split("to the point.\n\n")
                .nth(1)
                .and_then(|rest| rest.split("\n\nQuestion:").next())
                .unwrap_or_default()
                .to_string();
            Ok(format!("{context}\n"))
        }
    }

    struct UnusedSummarizer;

    #[async_trait]
    impl SummarizationClient for UnusedSummarizer {
        async fn summarize(&self, _text: &str) -> Result<String, SummarizationClientError> {
            Ok("summary".into())
        }
    }

    fn service(temp: &TempDir, pages: Vec<PageText>, llm: EchoContextLlm) -> AssistantService {
        let config = Config {
            vector_store_dir: temp.path().join("db"),
            upload_dir: temp.path().join("uploads"),
            embedding_dimension: 64,
            ..Config::default()
        };
        AssistantService::with_components(
            config,
            ServiceComponents {
                embedding_client: Box::new(HashEmbeddingClient::new(64)),
                llm_client: Box::new(llm),
                summarization_client: Box::new(UnusedSummarizer),
                document_loader: Box::new(FixedLoader(pages)),
            },
        )
    }

    fn pages(texts: &[&str]) -> Vec<PageText> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| PageText {
                number: index + 1,
                text: text.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn upload_indexes_chunks_and_removes_staged_file() {
        let temp = TempDir::new().expect("tempdir");
        let service = service(
            &temp,
            pages(&["Mitochondria produce ATP.", "Ribosomes build proteins."]),
            EchoContextLlm::default(),
        );

        let outcome = service
            .upload_document("notes/biology.pdf", b"%PDF".to_vec())
            .await
            .expect("upload");

        assert_eq!(outcome.chunks_count, 2);
        assert_eq!(service.indexed_chunks().await.expect("count"), 2);
        let staged: Vec<_> = std::fs::read_dir(temp.path().join("uploads"))
            .expect("upload dir")
            .collect();
        assert!(staged.is_empty());
        assert_eq!(service.metrics_snapshot().chunks_indexed, 2);
    }

    #[tokio::test]
    async fn empty_document_is_rejected_and_nothing_is_stored() {
        let temp = TempDir::new().expect("tempdir");
        let service = service(&temp, pages(&["   "]), EchoContextLlm::default());

        let error = service
            .upload_document("blank.pdf", b"%PDF".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(error, ProcessingError::EmptyDocument(ref name) if name == "blank.pdf"));
        assert_eq!(service.indexed_chunks().await.expect("count"), 0);
        let staged: Vec<_> = std::fs::read_dir(temp.path().join("uploads"))
            .expect("upload dir")
            .collect();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn unbroken_non_ascii_page_is_indexed_within_budget() {
        let temp = TempDir::new().expect("tempdir");
        let text = "光合作用".repeat(700);
        let service = service(&temp, pages(&[text.as_str()]), EchoContextLlm::default());

        let outcome = service
            .upload_document("cjk.pdf", b"%PDF".to_vec())
            .await
            .expect("upload");

        assert!(outcome.chunks_count >= 3);
        assert_eq!(
            service.indexed_chunks().await.expect("count"),
            outcome.chunks_count
        );
        let hits = service.retrieve("光合作用").await.expect("retrieve");
        assert!(hits.iter().all(|hit| hit.text.chars().count() <= 1000));
        let staged: Vec<_> = std::fs::read_dir(temp.path().join("uploads"))
            .expect("upload dir")
            .collect();
        assert!(staged.is_empty());
    }

    #[tokio::test]
    async fn answers_derive_only_from_uploaded_content() {
        let temp = TempDir::new().expect("tempdir");
        let llm = EchoContextLlm::default();
        let service = service(
            &temp,
            pages(&["The mitochondria is the powerhouse of the cell."]),
            llm.clone(),
        );
        service
            .upload_document("cell.pdf", b"%PDF".to_vec())
            .await
            .expect("upload");

        let answer = service
            .answer_question("What is the powerhouse of the cell?")
            .await
            .expect("answer");

        assert_eq!(answer, "The mitochondria is the powerhouse of the cell.\n");
        let prompts = llm.prompts.lock().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].prompt.contains("Question: What is the powerhouse of the cell?"));
        assert_eq!(prompts[0].temperature, Some(ANSWER_TEMPERATURE));
    }

    #[tokio::test]
    async fn retrieval_is_capped_at_top_k() {
        let temp = TempDir::new().expect("tempdir");
        let texts: Vec<String> = (0..8).map(|n| format!("Fact number {n} about cells.")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let service = service(&temp, pages(&refs), EchoContextLlm::default());
        service
            .upload_document("facts.pdf", b"%PDF".to_vec())
            .await
            .expect("upload");

        let hits = service.retrieve("cells").await.expect("retrieve");
        assert_eq!(hits.len(), RETRIEVAL_TOP_K);
    }

    #[tokio::test]
    async fn reset_then_query_returns_dont_know_without_calling_llm() {
        let temp = TempDir::new().expect("tempdir");
        let llm = EchoContextLlm::default();
        let service = service(&temp, pages(&["Photosynthesis uses light."]), llm.clone());
        service
            .upload_document("plants.pdf", b"%PDF".to_vec())
            .await
            .expect("upload");

        service.reset().await.expect("first reset");
        service.reset().await.expect("second reset");

        let answer = service
            .answer_question("What does photosynthesis use?")
            .await
            .expect("answer");
        assert_eq!(answer, NO_DOCUMENTS_ANSWER);
        assert!(llm.prompts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn quiz_returns_raw_model_output_with_fixed_temperature() {
        let temp = TempDir::new().expect("tempdir");
        let llm = EchoContextLlm::default();
        let service = service(&temp, Vec::new(), llm.clone());

        let raw = service
            .generate_quiz("Water boils at 100C.", DEFAULT_QUIZ_QUESTIONS)
            .await
            .expect("quiz");

        let prompts = llm.prompts.lock().await;
        assert_eq!(prompts[0].temperature, Some(QUIZ_TEMPERATURE));
        assert!(prompts[0].prompt.contains("quiz with 5 multiple-choice questions"));
        // The echo model finds no answer-prompt markers, so the raw text is a bare newline.
        assert_eq!(raw, "\n");
    }

    #[test]
    fn sanitize_file_name_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\Unit 1.pdf"), "Unit_1.pdf");
        assert_eq!(sanitize_file_name(""), FALLBACK_UPLOAD_NAME);
        assert_eq!(sanitize_file_name("..."), FALLBACK_UPLOAD_NAME);
    }
}
