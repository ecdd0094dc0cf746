use async_trait::async_trait;

use super::types::CompletionRequest;
use crate::core::errors::PipelineError;

/// Maps text to fixed-dimension vectors. Used at ingestion and query time.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text. Fails with `PipelineError::Embedding` when the
    /// provider is unreachable or rejects the input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError>;

    /// Embed a batch, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;
}

/// Produces one completion for a prepared chat request.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, PipelineError>;
}
