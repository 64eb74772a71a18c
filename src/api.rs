//! HTTP surface for the Educational Content Assistant.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /` and `GET /health` – Liveness probes with fixed payloads.
//! - `POST /upload` – Accept a multipart `file` field, extract and chunk the PDF, embed the chunks,
//!   and append them to the vector store. Returns `chunks_count`.
//! - `POST /query` – Answer a question from the most similar stored passages.
//! - `POST /summary` – Compress raw text into a short summary.
//! - `POST /reset` – Delete the persisted vector store.
//! - `GET /metrics` – Observe ingestion and query counters.
//!
//! Every failure is rendered as HTTP 500 with a `{"detail": message}` body.

use crate::metrics::MetricsSnapshot;
use crate::processing::{AssistantApi, ProcessingError};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const UPLOAD_FIELD: &str = "file";

/// Build the HTTP router exposing the assistant API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: AssistantApi + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/upload", post(upload_document::<S>))
        .route("/query", post(query::<S>))
        .route("/summary", post(summary::<S>))
        .route("/reset", post(reset::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Response body carrying a human-readable message.
#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Welcome to the Educational Content Assistant API",
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Success response for `POST /upload`.
#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    chunks_count: usize,
}

/// Stage the uploaded PDF and index its chunks.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: AssistantApi,
{
    let (file_name, contents) = loop {
        let Some(field) = multipart.next_field().await? else {
            return Err(AppError::MissingField(UPLOAD_FIELD));
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let contents = field.bytes().await?;
        break (file_name, contents.to_vec());
    };

    tracing::info!(file_name = %file_name, bytes = contents.len(), "Upload received");
    let outcome = service.upload_document(&file_name, contents).await?;
    Ok(Json(UploadResponse {
        message: "Document processed and stored successfully",
        chunks_count: outcome.chunks_count,
    }))
}

/// Request body for `POST /query`.
#[derive(Deserialize)]
struct QueryRequest {
    question: String,
}

/// Success response for `POST /query`.
#[derive(Serialize)]
struct QueryResponse {
    answer: String,
}

/// Answer a question from the indexed documents.
async fn query<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError>
where
    S: AssistantApi,
{
    let answer = service.answer_question(&request.question).await?;
    Ok(Json(QueryResponse { answer }))
}

/// Request body for `POST /summary`.
#[derive(Deserialize)]
struct SummaryRequest {
    text: String,
}

/// Success response for `POST /summary`.
#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

async fn summary<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: AssistantApi,
{
    let summary = service.summarize(&request.text).await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Drop every stored passage. Succeeds when nothing is stored.
async fn reset<S>(State(service): State<Arc<S>>) -> Result<Json<MessageResponse>, AppError>
where
    S: AssistantApi,
{
    service.reset().await?;
    Ok(Json(MessageResponse {
        message: "Database cleared",
    }))
}

/// Return the ingestion and query counters accumulated since startup.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: AssistantApi,
{
    Json(service.metrics_snapshot())
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Processing(#[from] ProcessingError),
    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Missing multipart field: {0}")]
    MissingField(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Processing(error) if error.is_config_error() => {
                tracing::error!(error = %error, "Request failed on missing configuration");
            }
            other => tracing::warn!(error = %other, "Request failed"),
        }
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{AssistantApi, ProcessingError, UploadOutcome};
    use crate::summarization::SummarizationClientError;
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "edu-assist-boundary";

    #[derive(Clone, Debug, PartialEq)]
    struct UploadCall {
        file_name: String,
        contents: Vec<u8>,
    }

    #[derive(Clone, Default)]
    struct StubAssistant {
        uploads: Arc<Mutex<Vec<UploadCall>>>,
        questions: Arc<Mutex<Vec<String>>>,
        fail_summary: bool,
    }

    #[async_trait]
    impl AssistantApi for StubAssistant {
        async fn upload_document(
            &self,
            file_name: &str,
            contents: Vec<u8>,
        ) -> Result<UploadOutcome, ProcessingError> {
            self.uploads.lock().await.push(UploadCall {
                file_name: file_name.to_string(),
                contents,
            });
            Ok(UploadOutcome { chunks_count: 3 })
        }

        async fn answer_question(&self, question: &str) -> Result<String, ProcessingError> {
            self.questions.lock().await.push(question.to_string());
            Ok(format!("answer to {question}"))
        }

        async fn summarize(&self, text: &str) -> Result<String, ProcessingError> {
            if self.fail_summary {
                return Err(SummarizationClientError::CompressionFailed.into());
            }
            Ok(format!("short {text}"))
        }

        async fn reset(&self) -> Result<(), ProcessingError> {
            Ok(())
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_indexed: 1,
                chunks_indexed: 3,
                questions_answered: 2,
            }
        }
    }

    fn app(stub: &StubAssistant) -> Router {
        create_router(Arc::new(stub.clone()))
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn multipart_request(field: &str, file_name: &str, contents: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    #[tokio::test]
    async fn root_and_health_return_fixed_payloads() {
        let stub = StubAssistant::default();

        let response = app(&stub)
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await["message"],
            "Welcome to the Educational Content Assistant API"
        );

        let response = app(&stub)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(read_json(response).await, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn upload_route_forwards_file_field() {
        let stub = StubAssistant::default();

        let response = app(&stub)
            .oneshot(multipart_request("file", "lecture.pdf", b"%PDF-1.4 body"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = read_json(response).await;
        assert_eq!(json["message"], "Document processed and stored successfully");
        assert_eq!(json["chunks_count"], 3);

        let uploads = stub.uploads.lock().await;
        assert_eq!(
            *uploads,
            vec![UploadCall {
                file_name: "lecture.pdf".into(),
                contents: b"%PDF-1.4 body".to_vec(),
            }]
        );
    }

    #[tokio::test]
    async fn upload_without_file_field_is_server_error() {
        let stub = StubAssistant::default();

        let response = app(&stub)
            .oneshot(multipart_request("attachment", "lecture.pdf", b"%PDF"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = read_json(response).await;
        assert!(json["detail"].as_str().unwrap_or_default().contains("file"));
        assert!(stub.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn query_route_returns_answer() {
        let stub = StubAssistant::default();

        let response = app(&stub)
            .oneshot(json_request(
                Method::POST,
                "/query",
                json!({ "question": "What is osmosis?" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({ "answer": "answer to What is osmosis?" })
        );
        assert_eq!(*stub.questions.lock().await, vec!["What is osmosis?"]);
    }

    #[tokio::test]
    async fn summary_failure_renders_detail() {
        let stub = StubAssistant {
            fail_summary: true,
            ..StubAssistant::default()
        };

        let response = app(&stub)
            .oneshot(json_request(
                Method::POST,
                "/summary",
                json!({ "text": "long notes" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_json(response).await,
            json!({ "detail": "Scaledown API compression failed." })
        );
    }

    #[tokio::test]
    async fn reset_and_metrics_routes() {
        let stub = StubAssistant::default();

        let response = app(&stub)
            .oneshot(
                Request::post("/reset")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(
            read_json(response).await,
            json!({ "message": "Database cleared" })
        );

        let response = app(&stub)
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("router response");
        assert_eq!(
            read_json(response).await,
            json!({ "documents_indexed": 1, "chunks_indexed": 3, "questions_answered": 2 })
        );
    }
}
