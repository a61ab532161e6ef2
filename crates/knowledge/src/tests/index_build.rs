//! Index builder behavior against a real SQLite file.

use super::support::{textbook_config, write_source, CountingEmbedder};
use crate::builder::ensure_index;
use crate::embeddings::providers::MockProvider;
use crate::index::SqliteIndex;
use crate::types::BuildOptions;
use crate::vector_index::VectorIndex;
use tempfile::TempDir;
use tutor_core::AppError;

#[tokio::test]
async fn test_fresh_build_commits_every_chunk() {
    let dir = TempDir::new().unwrap();
    let config = textbook_config(&dir);
    let embedder = CountingEmbedder::new();

    let handle = ensure_index(&config.source_path(), &config, &embedder, BuildOptions::default())
        .await
        .unwrap();

    assert!(!handle.reused);
    assert_eq!(handle.count, 3);
    assert_eq!(embedder.embedded(), 3);

    let marker = handle.index.marker().unwrap().unwrap();
    assert_eq!(marker.chunk_count, 3);
    assert_eq!(marker.embedding_model, "trigram-v1");
    assert_eq!(marker.dimensions, 2048);
}

#[tokio::test]
async fn test_second_ensure_reuses_without_embedding() {
    let dir = TempDir::new().unwrap();
    let config = textbook_config(&dir);

    let first = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .unwrap();
    drop(first);

    let embedder = CountingEmbedder::new();
    let second = ensure_index(&config.source_path(), &config, &embedder, BuildOptions::default())
        .await
        .unwrap();

    assert!(second.reused);
    assert_eq!(second.count, 3);
    assert_eq!(embedder.embedded(), 0);
}

#[tokio::test]
async fn test_rebuild_yields_same_count_and_ids() {
    let dir = TempDir::new().unwrap();
    let config = textbook_config(&dir);

    let first = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .unwrap();
    let first_ids = first.index.sample_ids(10).unwrap();
    let first_count = first.count;
    drop(first);

    let rebuilt = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions { rebuild: true },
    )
    .await
    .unwrap();

    assert!(!rebuilt.reused);
    assert_eq!(rebuilt.count, first_count);
    assert_eq!(rebuilt.index.sample_ids(10).unwrap(), first_ids);
    assert_eq!(first_ids, vec!["test_docs-0-0", "test_docs-1-0", "test_docs-2-0"]);
}

#[tokio::test]
async fn test_long_page_chunk_count() {
    let dir = TempDir::new().unwrap();
    let mut config = textbook_config(&dir);
    write_source(dir.path(), "long.txt", &"photosynthesis ".repeat(30));
    config.pdf_path = "long.txt".into();

    // 450 characters, window 200, stride 180
    let handle = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(handle.count, 3);
}

#[tokio::test]
async fn test_batches_cover_every_chunk() {
    let dir = TempDir::new().unwrap();
    let mut config = textbook_config(&dir);
    config.embedding_batch_size = 2;

    let embedder = CountingEmbedder::new();
    let handle = ensure_index(&config.source_path(), &config, &embedder, BuildOptions::default())
        .await
        .unwrap();

    assert_eq!(handle.count, 3);
    assert_eq!(embedder.embedded(), 3);
}

#[tokio::test]
async fn test_failed_embedding_commits_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = textbook_config(&dir);
    config.embedding_batch_size = 1;

    let err = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::failing_after(2),
        BuildOptions::default(),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, AppError::Embedding(_)));

    let index = SqliteIndex::open(&config.persist_path(), &config.collection_name).unwrap();
    assert_eq!(index.count().unwrap(), 0);
    assert!(index.marker().unwrap().is_none());

    // The next start builds from scratch
    let handle = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .unwrap();
    assert!(!handle.reused);
    assert_eq!(handle.count, 3);
}

#[tokio::test]
async fn test_missing_source_is_document_error() {
    let dir = TempDir::new().unwrap();
    let mut config = textbook_config(&dir);
    config.pdf_path = "missing.pdf".into();

    let err = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .err()
    .unwrap();

    assert!(matches!(err, AppError::Document(_)));
}

#[tokio::test]
async fn test_failed_rebuild_keeps_previous_build() {
    let dir = TempDir::new().unwrap();
    let config = textbook_config(&dir);

    let first = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(first.count, 3);
    drop(first);

    let err = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::failing_after(0),
        BuildOptions { rebuild: true },
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, AppError::Embedding(_)));

    let index = SqliteIndex::open(&config.persist_path(), &config.collection_name).unwrap();
    assert_eq!(index.count().unwrap(), 3);
    assert_eq!(index.marker().unwrap().unwrap().dimensions, 2048);
}

#[tokio::test]
async fn test_build_from_other_embedder_is_replaced() {
    let dir = TempDir::new().unwrap();
    let config = textbook_config(&dir);

    let first = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .unwrap();
    drop(first);

    let embedder = MockProvider::new(64);
    let handle = ensure_index(&config.source_path(), &config, &embedder, BuildOptions::default())
        .await
        .unwrap();

    assert!(!handle.reused);
    assert_eq!(handle.count, 3);
    assert_eq!(handle.index.marker().unwrap().unwrap().dimensions, 64);
}
