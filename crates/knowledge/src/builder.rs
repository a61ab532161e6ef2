//! Index builder: makes sure a complete index exists before any question is asked.

use crate::chunker;
use crate::embeddings::{embed_with_timeout, EmbeddingProvider};
use crate::index::SqliteIndex;
use crate::loader;
use crate::types::{BuildMarker, BuildOptions, IndexEntry};
use crate::vector_index::VectorIndex;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tutor_core::{AppConfig, AppError, AppResult};

/// An opened, fully built index.
pub struct IndexHandle {
    pub index: Arc<SqliteIndex>,

    /// Chunks in the collection
    pub count: usize,

    /// Whether an existing build was reused
    pub reused: bool,
}

/// Ensure the collection named by `config` exists and is complete.
///
/// An existing build (marker present, at least one chunk) is reused without
/// loading or embedding anything. Otherwise the source is loaded, chunked and
/// embedded, and everything is committed in a single transaction together with
/// the build marker. Nothing is committed if any step fails, so a failed
/// rebuild leaves the previous build in place.
///
/// A build whose marker names a different embedding model or vector length
/// than `embedder` is stale: its vectors cannot be compared with query
/// embeddings, so it is rebuilt rather than reused.
pub async fn ensure_index(
    source_path: &Path,
    config: &AppConfig,
    embedder: &dyn EmbeddingProvider,
    options: BuildOptions,
) -> AppResult<IndexHandle> {
    let persist_dir = config.persist_path();
    let index = SqliteIndex::open(&persist_dir, &config.collection_name)?;

    let existing = index.count()?;
    if existing > 0 && !options.rebuild {
        match index.marker()? {
            Some(marker) if is_stale(&marker, embedder) => {
                tracing::warn!(
                    "Collection '{}' was built with {} ({} dims) but {} ({} dims) is configured; rebuilding",
                    config.collection_name,
                    marker.embedding_model,
                    marker.dimensions,
                    embedder.model_name(),
                    embedder.dimensions()
                );
            }
            _ => {
                tracing::info!(
                    "Reusing collection '{}' at {:?} ({} chunks)",
                    config.collection_name,
                    persist_dir,
                    existing
                );

                return Ok(IndexHandle {
                    index: Arc::new(index),
                    count: existing,
                    reused: true,
                });
            }
        }
    } else if options.rebuild {
        tracing::info!(
            "Rebuild requested, replacing collection '{}' ({} chunks)",
            config.collection_name,
            existing
        );
    }

    let start = Instant::now();
    tracing::info!("Building collection '{}' from {:?}", config.collection_name, source_path);

    let pages = loader::load_document(source_path)?;
    let chunks = chunker::chunk_pages(
        &pages,
        &source_path.to_string_lossy(),
        &config.collection_name,
        config.chunk_size,
        config.chunk_overlap,
    );

    if chunks.is_empty() {
        return Err(AppError::Document(format!(
            "No chunks produced from {:?}",
            source_path
        )));
    }

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut entries = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(config.embedding_batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embed_with_timeout(embedder, &texts, timeout).await?;

        entries.extend(
            batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(chunk, embedding)| IndexEntry { chunk, embedding }),
        );

        tracing::debug!("Embedded {}/{} chunks", entries.len(), chunks.len());
    }

    let marker = BuildMarker {
        chunk_count: entries.len(),
        embedding_model: embedder.model_name().to_string(),
        dimensions: embedder.dimensions(),
        built_at: Utc::now(),
    };

    // Replaces the previous build, if any, in the same transaction
    index.insert(&entries, &marker)?;

    let count = index.count()?;

    tracing::info!(
        "Built collection '{}': {} pages, {} chunks in {:.2}s",
        config.collection_name,
        pages.len(),
        count,
        start.elapsed().as_secs_f64()
    );

    Ok(IndexHandle {
        index: Arc::new(index),
        count,
        reused: false,
    })
}

fn is_stale(marker: &BuildMarker, embedder: &dyn EmbeddingProvider) -> bool {
    marker.embedding_model != embedder.model_name() || marker.dimensions != embedder.dimensions()
}
