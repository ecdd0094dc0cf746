use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::PipelineError;

/// One record to persist: caller-assigned ID, embedding, metadata document.
/// ID uniqueness is the caller's responsibility.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Value,
}

/// A similarity-search hit as returned by the index, metadata still raw.
/// The retrieval stage parses it into typed chunk metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone)]
pub struct IndexStats {
    pub dimension: usize,
    pub total_vectors: usize,
}

/// Abstract interface to the similarity-search index.
///
/// All failures map to `PipelineError::Retrieval`; the message names the
/// failed operation.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-`k` nearest stored vectors, descending score, metadata included.
    /// Zero matches is not an error.
    async fn query(&self, vector: &[f32], top_k: usize)
        -> Result<Vec<IndexMatch>, PipelineError>;

    /// Insert records, overwriting any existing record with the same ID.
    async fn upsert(&self, records: Vec<UpsertRecord>) -> Result<(), PipelineError>;

    async fn stats(&self) -> Result<IndexStats, PipelineError>;
}
