use std::sync::Arc;

use crate::core::errors::PipelineError;
use crate::index::VectorIndex;
use crate::llm::EmbeddingProvider;

use super::types::Match;

/// Turns a question into ranked supporting matches: one embedding call, one
/// similarity search. Matches keep the index's descending-score order; this
/// stage never re-sorts.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Zero matches is a valid, empty result. Callers guard against empty
    /// queries before reaching this stage.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Match>, PipelineError> {
        let embedding = self.embedder.embed(query).await?;
        let hits = self.index.query(&embedding, top_k).await?;
        tracing::debug!("retrieved {} matches (top_k {})", hits.len(), top_k);
        Ok(hits.into_iter().map(Match::from_index).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::index::{IndexMatch, IndexStats, UpsertRecord};

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
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

    struct FixedIndex {
        hits: Vec<IndexMatch>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn query(
            &self,
            _vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<IndexMatch>, PipelineError> {
            Ok(self.hits.clone())
        }

        async fn upsert(&self, _records: Vec<UpsertRecord>) -> Result<(), PipelineError> {
            Ok(())
        }

        async fn stats(&self) -> Result<IndexStats, PipelineError> {
            Ok(IndexStats {
                dimension: 4,
                total_vectors: self.hits.len(),
            })
        }
    }

    fn hit(id: &str, score: f32, moon: &str) -> IndexMatch {
        IndexMatch {
            id: id.to_string(),
            score,
            metadata: json!({ "moon_name": moon }),
        }
    }

    #[tokio::test]
    async fn preserves_index_order_without_resorting() {
        // Deliberately not score-descending: the index's order is authoritative.
        let index = FixedIndex {
            hits: vec![hit("a", 0.2, "Io"), hit("b", 0.9, "Europa")],
        };
        let retriever = Retriever::new(Arc::new(FixedEmbedder), Arc::new(index));

        let matches = retriever.retrieve("volcanoes", 3).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert_eq!(matches[1].id, "b");
        assert_eq!(matches[0].metadata.moon_name.as_deref(), Some("Io"));
    }

    #[tokio::test]
    async fn zero_matches_is_an_empty_result_not_an_error() {
        let retriever =
            Retriever::new(Arc::new(FixedEmbedder), Arc::new(FixedIndex { hits: vec![] }));
        let matches = retriever.retrieve("xyzzy", 3).await.unwrap();
        assert!(matches.is_empty());
    }
}
