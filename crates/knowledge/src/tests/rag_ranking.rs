//! Retrieval ranking over a built index.

use super::support::{textbook_config, CountingEmbedder, MAGNESIUM, WATER};
use crate::builder::ensure_index;
use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::retriever::Retriever;
use crate::types::BuildOptions;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tutor_core::{AppError, AppResult};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn retriever_over_textbook(dir: &TempDir, top_k: usize) -> Retriever {
    let config = textbook_config(dir);
    let embedder = Arc::new(CountingEmbedder::new());
    let handle = ensure_index(
        &config.source_path(),
        &config,
        embedder.as_ref(),
        BuildOptions::default(),
    )
    .await
    .unwrap();

    Retriever::new(embedder, handle.index, top_k, TIMEOUT)
}

#[derive(Debug)]
struct BrokenEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for BrokenEmbedder {
    fn provider_name(&self) -> &str {
        "broken"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        2048
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding("model not loaded".to_string()))
    }
}

#[tokio::test]
async fn test_most_relevant_chunk_first() {
    let dir = TempDir::new().unwrap();
    let retriever = retriever_over_textbook(&dir, 4).await;

    let chunks = retriever
        .retrieve("What is the chemical formula for water?")
        .await
        .unwrap();
    assert_eq!(chunks[0].text, WATER);

    let chunks = retriever
        .retrieve("Why does magnesium ribbon burn with a white flame?")
        .await
        .unwrap();
    assert_eq!(chunks[0].text, MAGNESIUM);
}

#[tokio::test]
async fn test_top_k_bounds_results() {
    let dir = TempDir::new().unwrap();
    let retriever = retriever_over_textbook(&dir, 2).await;

    let chunks = retriever.retrieve("oxygen in food").await.unwrap();
    assert_eq!(chunks.len(), 2);
}

#[tokio::test]
async fn test_blank_question_retrieves_nothing() {
    let dir = TempDir::new().unwrap();
    let retriever = retriever_over_textbook(&dir, 4).await;

    assert!(retriever.retrieve("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_embedding_failure_propagates() {
    let dir = TempDir::new().unwrap();
    let config = textbook_config(&dir);
    let handle = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .unwrap();

    let retriever = Retriever::new(Arc::new(BrokenEmbedder), handle.index, 4, TIMEOUT);
    let err = retriever.retrieve("What is rancidity?").await.unwrap_err();
    assert!(matches!(err, AppError::Embedding(_)));
}

#[tokio::test]
async fn test_index_of_other_dimensions_retrieves_nothing() {
    let dir = TempDir::new().unwrap();
    let config = textbook_config(&dir);
    let handle = ensure_index(
        &config.source_path(),
        &config,
        &CountingEmbedder::new(),
        BuildOptions::default(),
    )
    .await
    .unwrap();

    let retriever = Retriever::new(Arc::new(MockProvider::new(64)), handle.index, 4, TIMEOUT);
    let chunks = retriever
        .retrieve("Why does magnesium ribbon burn with a white flame?")
        .await
        .unwrap();

    assert!(chunks.is_empty());
}
