use eduassist::{
    config::{self, Config},
    embedding::{EmbeddingTask, get_embedding_client},
    llm::{CompletionRequest, GeminiLlmClient, LlmClient},
    summarization::{ScaledownClient, SummarizationClient},
};

fn live_config() -> Config {
    config::init_config().expect("configuration from environment")
}

#[tokio::test]
#[ignore = "Requires GOOGLE_API_KEY and network access"]
async fn live_gemini_embedding_roundtrip() {
    let config = live_config();
    let client = get_embedding_client(&config).expect("embedding client");
    let vectors = client
        .generate_embeddings(
            vec!["edu-assist live embedding".to_string()],
            EmbeddingTask::Document,
        )
        .await
        .expect("failed to request embeddings from provider");
    assert_eq!(vectors.len(), 1, "expected embedding per input chunk");
    assert_eq!(
        vectors[0].len(),
        config.embedding_dimension,
        "embedding dimension mismatch"
    );
}

#[tokio::test]
#[ignore = "Requires GOOGLE_API_KEY and network access"]
async fn live_gemini_completion() {
    let config = live_config();
    let client = GeminiLlmClient::new(&config).expect("llm client");
    let answer = client
        .complete(CompletionRequest {
            prompt: "Reply with the single word: ready".into(),
            temperature: Some(0.0),
        })
        .await
        .expect("completion");
    assert!(!answer.trim().is_empty());
}

#[tokio::test]
#[ignore = "Requires SCALEDOWN_API_KEY and network access"]
async fn live_scaledown_summary() {
    let config = live_config();
    let client = ScaledownClient::new(&config).expect("scaledown client");
    let summary = client
        .summarize("Photosynthesis converts light energy into chemical energy stored in glucose.")
        .await
        .expect("summary");
    assert!(!summary.is_empty());
}
