//! Pipeline orchestrator: retrieve, then generate.

use crate::answerer::Answerer;
use crate::retriever::Retriever;
use crate::types::PipelineState;
use tutor_core::{AppError, AppResult};

pub struct Pipeline {
    retriever: Retriever,
    answerer: Answerer,
}

impl Pipeline {
    pub fn new(retriever: Retriever, answerer: Answerer) -> Self {
        Self {
            retriever,
            answerer,
        }
    }

    /// Answer a question.
    pub async fn run(&self, question: &str) -> AppResult<String> {
        Ok(self.run_with_state(question).await?.answer)
    }

    /// Answer a question and return the full per-query state.
    ///
    /// A blank question is rejected before any retrieval or generation.
    pub async fn run_with_state(&self, question: &str) -> AppResult<PipelineState> {
        if question.trim().is_empty() {
            return Err(AppError::EmptyInput);
        }

        let mut state = PipelineState {
            question: question.to_string(),
            ..Default::default()
        };

        tracing::info!(stage = "retrieving", "Processing question: {}", question);
        state.context = self.retriever.retrieve(&state.question).await?;

        tracing::info!(stage = "generating", context_chunks = state.context.len(), "Generating answer");
        state.answer = self
            .answerer
            .answer(&state.question, &state.context)
            .await?;

        tracing::info!(stage = "answered", answer_chars = state.answer.chars().count(), "Answer ready");

        Ok(state)
    }
}
