use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::provider::{CompletionProvider, EmbeddingProvider};
use super::types::CompletionRequest;
use crate::core::config::ProviderSettings;
use crate::core::errors::PipelineError;

const BACKOFF_BASE_MS: u64 = 500;
const MAX_BACKOFF_SHIFT: u32 = 4;

/// Client for an OpenAI-compatible API, covering both the embeddings and the
/// chat-completions endpoints. Embedding calls retry transient failures;
/// completion calls do not, so chat requests fail fast into the pipeline's
/// fallback paths.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    embedding_model: String,
    completion_model: String,
    dimensions: usize,
    max_retries: u32,
    client: Client,
}

impl OpenAiClient {
    pub fn new(settings: &ProviderSettings, dimensions: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !settings.api_key.trim().is_empty(),
            "provider API key must not be empty"
        );

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", settings.api_key))
            .map_err(|_| anyhow::anyhow!("provider API key contains invalid header characters"))?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            embedding_model: settings.embedding_model.clone(),
            completion_model: settings.completion_model.clone(),
            dimensions,
            max_retries: settings.max_retries,
            client,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| PipelineError::Embedding("provider returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        // The legacy ada-002 model rejects an explicit dimensions parameter.
        let dimensions = self
            .embedding_model
            .starts_with("text-embedding-3")
            .then_some(self.dimensions);
        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
            dimensions,
        };

        let mut attempt: u32 = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(PipelineError::embedding)?;

            let status = response.status();
            if status.is_success() {
                let payload: EmbeddingResponse =
                    response.json().await.map_err(PipelineError::embedding)?;
                let mut data = payload.data;
                data.sort_by_key(|item| item.index);
                if data.len() != texts.len() {
                    return Err(PipelineError::Embedding(format!(
                        "expected {} embeddings, got {}",
                        texts.len(),
                        data.len()
                    )));
                }
                return Ok(data.into_iter().map(|item| item.embedding).collect());
            }

            let retryable = status.as_u16() == 429 || status.is_server_error();
            if retryable && attempt < self.max_retries {
                let shift = attempt.min(MAX_BACKOFF_SHIFT);
                let delay = Duration::from_millis(BACKOFF_BASE_MS * (1 << shift));
                tracing::warn!(
                    "embedding request returned {}, retrying in {:?} (attempt {}/{})",
                    status,
                    delay,
                    attempt + 1,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Embedding(format!(
                "embedding request returned {}: {}",
                status, text
            )));
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, PipelineError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut body = json!({
            "model": self.completion_model,
            "messages": request.messages,
        });
        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(m) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(m));
            }
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::synthesis)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Synthesis(format!(
                "completion request returned {}: {}",
                status, text
            )));
        }

        let payload: Value = response.json().await.map_err(PipelineError::synthesis)?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }
}
