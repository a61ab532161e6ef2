//! Retriever: finds the chunks most relevant to a question.

use crate::embeddings::{embed_with_timeout, EmbeddingProvider};
use crate::types::DocumentChunk;
use crate::vector_index::VectorIndex;
use std::sync::Arc;
use std::time::Duration;
use tutor_core::AppResult;

pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    timeout: Duration,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            embedder,
            index,
            top_k,
            timeout,
        }
    }

    /// Top-K chunks by cosine similarity to the question, best first.
    ///
    /// A blank question, an unavailable or empty index, or an index built with
    /// a different embedding model yields no chunks rather than an error.
    /// Embedding failures propagate.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<DocumentChunk>> {
        if question.trim().is_empty() {
            tracing::debug!("Blank question, skipping retrieval");
            return Ok(Vec::new());
        }

        match self.index.count() {
            Ok(0) => {
                tracing::warn!("Vector index is empty, retrieving nothing");
                return Ok(Vec::new());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Vector index unavailable: {}", e);
                return Ok(Vec::new());
            }
        }

        if let Ok(Some(marker)) = self.index.marker() {
            if marker.embedding_model != self.embedder.model_name()
                || marker.dimensions != self.embedder.dimensions()
            {
                tracing::warn!(
                    "Index was built with {} ({} dims), questions are embedded with {} ({} dims); retrieving nothing",
                    marker.embedding_model,
                    marker.dimensions,
                    self.embedder.model_name(),
                    self.embedder.dimensions()
                );
                return Ok(Vec::new());
            }
        }

        let query = vec![question.to_string()];
        let query_embedding = embed_with_timeout(self.embedder.as_ref(), &query, self.timeout)
            .await?
            .pop()
            .unwrap_or_default();

        // The scan reads every stored vector, so keep it off the async workers
        let index = Arc::clone(&self.index);
        let top_k = self.top_k;
        let search =
            tokio::task::spawn_blocking(move || index.similarity_search(&query_embedding, top_k))
                .await;

        let results = match search {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                tracing::warn!("Similarity search failed: {}", e);
                return Ok(Vec::new());
            }
            Err(e) => {
                tracing::warn!("Similarity search task failed: {}", e);
                return Ok(Vec::new());
            }
        };

        if let (Some(best), Some(worst)) = (results.first(), results.last()) {
            tracing::info!(
                "Retrieved {} chunks (top score: {:.3}, lowest: {:.3})",
                results.len(),
                best.1,
                worst.1
            );
        }

        Ok(results.into_iter().map(|(chunk, _score)| chunk).collect())
    }
}
