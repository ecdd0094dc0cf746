use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use jupiter_atlas::core::config::{AppPaths, ConfigService, Settings};
use jupiter_atlas::core::logging;
use jupiter_atlas::index::{PineconeIndex, VectorIndex};
use jupiter_atlas::ingest::{read_corpus, Ingestor};
use jupiter_atlas::llm::OpenAiClient;

/// Reads the TSV corpus and upserts embeddings into the vector index.
///
/// Usage: `ingest [corpus-path]`. Without an argument the corpus is read
/// from the project data directory.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let config = ConfigService::new(paths.clone());
    let settings = Settings::load(&config.load_config()).context("invalid configuration")?;

    let corpus_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.corpus_path());

    tracing::info!("Reading corpus from {}", corpus_path.display());
    let chunks = read_corpus(&corpus_path)?;
    anyhow::ensure!(!chunks.is_empty(), "corpus contains no rows");
    tracing::info!("Corpus holds {} chunks", chunks.len());

    let provider = Arc::new(OpenAiClient::new(
        &settings.provider,
        settings.index.dimension,
    )?);
    let index = Arc::new(PineconeIndex::new(&settings.index)?);

    let ingestor = Ingestor::new(provider, index.clone());
    let written = ingestor.run(&chunks).await?;

    let stats = index.stats().await?;
    tracing::info!(
        "Ingestion complete: {} chunks written, index now holds {} vectors (dimension {})",
        written,
        stats.total_vectors,
        stats.dimension
    );

    Ok(())
}
