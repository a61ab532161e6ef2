//! Application context built once at startup.

use crate::answerer::Answerer;
use crate::builder::{ensure_index, IndexHandle};
use crate::diagnostics;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::history::QueryHistory;
use crate::index::SqliteIndex;
use crate::pipeline::Pipeline;
use crate::retriever::Retriever;
use crate::types::{BuildOptions, IndexDetails, PipelineState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tutor_core::{AppConfig, AppResult};
use tutor_llm::{create_client, LlmClient};
use tutor_prompt::load_prompt;

/// Everything a front end needs to answer questions.
///
/// Questions are answered one at a time.
pub struct TutorContext {
    config: AppConfig,
    index: Arc<SqliteIndex>,
    index_count: usize,
    history: QueryHistory,
    pipeline: Mutex<Pipeline>,
}

impl TutorContext {
    /// Build the context from configuration: create the collaborators, make
    /// sure the index exists and wire up the pipeline.
    pub async fn initialize(config: AppConfig, options: BuildOptions) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let embedder = create_provider(&config).await?;
        let client = create_client(&config.provider, Some(&config.endpoint), timeout)?;

        Self::with_collaborators(config, embedder, client, options).await
    }

    /// Build the context around the given embedding provider and LLM client.
    pub async fn with_collaborators(
        config: AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        client: Arc<dyn LlmClient>,
        options: BuildOptions,
    ) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let IndexHandle {
            index,
            count,
            reused,
        } = ensure_index(&config.source_path(), &config, embedder.as_ref(), options).await?;

        tracing::info!(
            "Vector index ready: {} chunks ({})",
            count,
            if reused { "reused" } else { "built" }
        );

        let prompt = load_prompt(&config.workspace, &config.prompt_id)?;

        let retriever = Retriever::new(embedder, index.clone(), config.top_k, timeout);
        let answerer = Answerer::new(
            client,
            prompt,
            config.model.clone(),
            config.grade_level.clone(),
            timeout,
        )
        .with_sampling(config.temperature, config.max_tokens);

        let history = QueryHistory::new(config.history_path());

        Ok(Self {
            config,
            index,
            index_count: count,
            history,
            pipeline: Mutex::new(Pipeline::new(retriever, answerer)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    /// Chunk count reported when the index was ensured at startup.
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Answer a question, waiting for any question already in progress.
    pub async fn ask(&self, question: &str) -> AppResult<PipelineState> {
        let pipeline = self.pipeline.lock().await;
        pipeline.run_with_state(question).await
    }

    /// Record an answered question in the history file.
    ///
    /// The write runs on the blocking pool; failures are logged, never returned.
    pub async fn record_answer(&self, state: &PipelineState) {
        let history = self.history.clone();
        let question = state.question.clone();
        let answer = state.answer.clone();
        let metadata = self.query_metadata();

        let written = tokio::task::spawn_blocking(move || {
            history.log_query(&question, &answer, metadata);
        })
        .await;

        if let Err(e) = written {
            tracing::error!("History write task failed: {}", e);
        }
    }

    /// Diagnostics for the persisted index.
    pub fn index_details(&self) -> IndexDetails {
        diagnostics::index_details(self.index.as_ref(), &self.config.persist_path())
    }

    /// Metadata stored with each history record.
    pub fn query_metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "pdf": self.config.pdf_path.to_string_lossy(),
        })
    }
}
