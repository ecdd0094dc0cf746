use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::pipeline::QueryOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Runs one chat query through the assistant.
///
/// The whole query executes inside a `chat_query` span carrying a generated
/// query ID, so pipeline events correlate with the request that caused them.
/// The conversation lock is taken with `try_lock`: a request arriving while
/// another is in flight gets an immediate 503 instead of queueing.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("chat_query", %query_id);

    async move {
        tracing::info!("chat query received");

        let mut conversation = match state.conversation.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("rejected: conversation is busy");
                return Err(ApiError::ServiceUnavailable);
            }
        };

        let outcome = state
            .assistant
            .handle_query(&mut conversation, &payload.message)
            .await;
        drop(conversation);

        match outcome {
            QueryOutcome::Ignored => {
                Err(ApiError::BadRequest("Message must not be empty".to_string()))
            }
            QueryOutcome::Busy => Err(ApiError::ServiceUnavailable),
            QueryOutcome::Responded(response) => {
                tracing::info!("answered with {} source(s)", response.sources.len());
                Ok(Json(json!({
                    "response": response.text,
                    "sources": response.sources,
                })))
            }
            QueryOutcome::Failed(err) => {
                tracing::error!("query failed: {}", err);
                Err(ApiError::from(err))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use tokio::sync::{Mutex, RwLock};
    use tracing::instrument::WithSubscriber;
    use tracing_subscriber::fmt::MakeWriter;

    use crate::core::config::{AppPaths, ConfigService, Settings};
    use crate::core::errors::PipelineError;
    use crate::index::{IndexMatch, IndexStats, UpsertRecord, VectorIndex};
    use crate::llm::{CompletionProvider, CompletionRequest, EmbeddingProvider};
    use crate::pipeline::{Assistant, Conversation, Retriever, Synthesizer};
    use crate::state::DisplayStatus;

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, PipelineError> {
            Ok(vec![0.0; 4])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    struct StubIndex;

    #[async_trait]
    impl VectorIndex for StubIndex {
        async fn query(
            &self,
            _vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<IndexMatch>, PipelineError> {
            Ok(Vec::new())
        }

        async fn upsert(&self, _records: Vec<UpsertRecord>) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn stats(&self) -> Result<IndexStats, PipelineError> {
            Ok(IndexStats {
                dimension: 4,
                total_vectors: 0,
            })
        }
    }

    struct StubCompletions;

    #[async_trait]
    impl CompletionProvider for StubCompletions {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, PipelineError> {
            Ok("An answer.".to_string())
        }
    }

    // Inert paths; nothing in the handler reads them.
    fn test_paths() -> AppPaths {
        let root = std::env::temp_dir();
        AppPaths {
            project_root: root.clone(),
            user_data_dir: root.clone(),
            log_dir: root.join("logs"),
            secrets_path: root.join("secrets.yaml"),
        }
    }

    fn test_state() -> Arc<AppState> {
        let paths = Arc::new(test_paths());
        let config = ConfigService::new(paths.clone());
        let settings = Settings::default();
        let pipeline = settings.pipeline.clone();

        let retriever = Retriever::new(Arc::new(StubEmbedder), Arc::new(StubIndex));
        let synthesizer = Synthesizer::new(Arc::new(StubCompletions), &pipeline);
        let assistant = Assistant::new(retriever, synthesizer, pipeline);

        Arc::new(AppState {
            paths,
            config,
            settings,
            conversation: Mutex::new(Conversation::new()),
            assistant,
            status: RwLock::new(DisplayStatus {
                system_status: "ONLINE".to_string(),
                current_time: "00:00:00".to_string(),
            }),
            started_at: Utc::now(),
        })
    }

    #[derive(Clone, Default)]
    struct CaptureWriter(Arc<StdMutex<Vec<u8>>>);

    impl CaptureWriter {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CaptureWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CaptureWriter {
        type Writer = CaptureWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn chat_events_carry_the_query_id_span() {
        let writer = CaptureWriter::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_ansi(false)
            .finish();

        let result = chat(
            State(test_state()),
            Json(ChatRequest {
                message: "Tell me about Io".to_string(),
            }),
        )
        .with_subscriber(subscriber)
        .await;

        assert!(result.is_ok());
        let output = writer.contents();
        assert!(
            output.contains("chat_query{query_id="),
            "expected span-scoped events, got: {output}"
        );
    }

    #[tokio::test]
    async fn busy_conversation_maps_to_service_unavailable() {
        let state = test_state();
        let _guard = state.conversation.try_lock().unwrap();

        let err = chat(
            State(state.clone()),
            Json(ChatRequest {
                message: "Io?".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();

        assert!(matches!(err, ApiError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn empty_message_maps_to_bad_request() {
        let err = chat(
            State(test_state()),
            Json(ChatRequest {
                message: "   ".to_string(),
            }),
        )
        .await
        .err()
        .unwrap();

        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "Message must not be empty"),
            other => panic!("expected bad request, got {:?}", other),
        }
    }
}
