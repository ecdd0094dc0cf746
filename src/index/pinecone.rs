use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::store::{IndexMatch, IndexStats, UpsertRecord, VectorIndex};
use crate::core::config::IndexSettings;
use crate::core::errors::PipelineError;

/// Data-plane client for a Pinecone-style vector index. The host is the
/// per-index endpoint; authentication is a static `Api-Key` header.
#[derive(Clone)]
pub struct PineconeIndex {
    base_url: String,
    name: String,
    namespace: Option<String>,
    client: Client,
}

impl PineconeIndex {
    pub fn new(settings: &IndexSettings) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !settings.api_key.trim().is_empty(),
            "index API key must not be empty"
        );
        anyhow::ensure!(
            !settings.host.trim().is_empty(),
            "index host must not be empty"
        );

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&settings.api_key)
            .map_err(|_| anyhow::anyhow!("index API key contains invalid header characters"))?;
        headers.insert("Api-Key", key);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: normalize_host(&settings.host),
            name: settings.name.clone(),
            namespace: settings.namespace.clone(),
            client,
        })
    }
}

fn normalize_host(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[derive(Deserialize)]
struct DescribeStatsResponse {
    #[serde(default)]
    dimension: usize,
    #[serde(rename = "totalVectorCount", default)]
    total_vector_count: usize,
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, PipelineError> {
        let url = format!("{}/query", self.base_url);

        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        if let (Some(obj), Some(ns)) = (body.as_object_mut(), &self.namespace) {
            obj.insert("namespace".to_string(), json!(ns));
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::retrieval)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Retrieval(format!(
                "query against index '{}' returned {}: {}",
                self.name, status, text
            )));
        }

        let payload: QueryResponse = response.json().await.map_err(PipelineError::retrieval)?;
        Ok(payload.matches)
    }

    async fn upsert(&self, records: Vec<UpsertRecord>) -> Result<(), PipelineError> {
        let url = format!("{}/vectors/upsert", self.base_url);

        let mut body = json!({ "vectors": records });
        if let (Some(obj), Some(ns)) = (body.as_object_mut(), &self.namespace) {
            obj.insert("namespace".to_string(), json!(ns));
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::retrieval)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Retrieval(format!(
                "upsert into index '{}' returned {}: {}",
                self.name, status, text
            )));
        }

        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, PipelineError> {
        let url = format!("{}/describe_index_stats", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({}))
            .send()
            .await
            .map_err(PipelineError::retrieval)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Retrieval(format!(
                "stats for index '{}' returned {}: {}",
                self.name, status, text
            )));
        }

        let payload: DescribeStatsResponse =
            response.json().await.map_err(PipelineError::retrieval)?;
        Ok(IndexStats {
            dimension: payload.dimension,
            total_vectors: payload.total_vector_count,
        })
    }
}
