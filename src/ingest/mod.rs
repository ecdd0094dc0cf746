//! Corpus ingestion: embed document chunks and upsert them into the vector
//! index in batches.

pub mod corpus;

use std::sync::Arc;

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::index::{UpsertRecord, VectorIndex};
use crate::llm::EmbeddingProvider;

pub use corpus::{read_corpus, DocumentChunk};

const BATCH_SIZE: usize = 32;

/// Stable chunk identity: hash of the fields that define the chunk's content.
/// Re-ingesting an unchanged row overwrites the same record in place; an
/// edited row gets a fresh ID. Fields are joined with a tab, which the TSV
/// format cannot carry inside a field, so two rows whose field boundaries
/// shift never hash alike.
pub fn chunk_id(chunk: &DocumentChunk) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chunk.moon_name.as_bytes());
    hasher.update(b"\t");
    hasher.update(chunk.title.as_bytes());
    hasher.update(b"\t");
    hasher.update(chunk.content.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embeds and upserts the whole corpus. Returns the number of records
    /// written. Any batch failure aborts the run; already-written batches
    /// stay in the index, which is harmless given stable IDs.
    ///
    /// The index dimension is checked up front so a misconfigured index
    /// fails the run before any embedding is requested.
    pub async fn run(&self, chunks: &[DocumentChunk]) -> anyhow::Result<usize> {
        let stats = self.index.stats().await?;
        anyhow::ensure!(
            stats.dimension == self.embedder.dimensions(),
            "index dimension {} does not match embedding dimension {}",
            stats.dimension,
            self.embedder.dimensions()
        );

        let mut written = 0;
        for batch in chunks.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.combined_text()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;

            let records: Vec<UpsertRecord> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, values)| UpsertRecord {
                    id: chunk_id(chunk),
                    values,
                    metadata: json!({
                        "moon_name": chunk.moon_name,
                        "title": chunk.title,
                        "source": chunk.source_url,
                        "Document Content": chunk.content,
                    }),
                })
                .collect();

            self.index.upsert(records).await?;
            written += batch.len();
            tracing::info!("ingested {}/{} chunks", written, chunks.len());
        }
        Ok(written)
    }
}
