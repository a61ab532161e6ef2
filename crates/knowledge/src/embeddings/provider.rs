//! Embedding provider trait and factory.

use super::providers::{MockProvider, OllamaProvider};
use std::sync::Arc;
use std::time::Duration;
use tutor_core::{AppConfig, AppError, AppResult};

/// Dimensions of the mock provider when none are configured.
const DEFAULT_MOCK_DIMENSIONS: usize = 384;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create the embedding provider named by the configuration.
///
/// The Ollama provider embeds a warm-up text once; when no dimensions are
/// configured, that embedding determines them.
pub async fn create_provider(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.embedding_provider.as_str() {
        "mock" => {
            let dimensions = config
                .embedding_dimensions
                .unwrap_or(DEFAULT_MOCK_DIMENSIONS);
            Ok(Arc::new(MockProvider::new(dimensions)))
        }

        "ollama" => {
            let provider = OllamaProvider::connect(
                &config.endpoint,
                &config.embedding_model,
                config.embedding_dimensions,
                Duration::from_secs(config.request_timeout_secs),
            )
            .await?;
            Ok(Arc::new(provider))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: mock, ollama",
            other
        ))),
    }
}

/// Embed a batch, failing with `AppError::Embedding` if it takes longer than `timeout`.
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    timeout: Duration,
) -> AppResult<Vec<Vec<f32>>> {
    let embeddings = tokio::time::timeout(timeout, provider.embed_batch(texts))
        .await
        .map_err(|_| {
            AppError::Embedding(format!(
                "{} did not return embeddings within {}s",
                provider.provider_name(),
                timeout.as_secs()
            ))
        })??;

    if embeddings.len() != texts.len() {
        return Err(AppError::Embedding(format!(
            "Expected {} embeddings, got {}",
            texts.len(),
            embeddings.len()
        )));
    }

    Ok(embeddings)
}
