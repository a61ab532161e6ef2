//! Answerer: turns a question and its retrieved context into a grounded answer.

use crate::types::DocumentChunk;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tutor_core::{AppError, AppResult};
use tutor_llm::{LlmClient, LlmRequest};
use tutor_prompt::{build_prompt, PromptDefinition};

pub struct Answerer {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    grade_level: String,
    timeout: Duration,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Answerer {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        model: impl Into<String>,
        grade_level: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            prompt,
            model: model.into(),
            grade_level: grade_level.into(),
            timeout,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sampling settings sent with every generation request; `None` keeps the
    /// model's default.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Line the prompt tells the model to use when the context has no answer.
    pub fn fallback(&self) -> &str {
        &self.prompt.fallback
    }

    /// Generate an answer from the question and context chunks.
    ///
    /// Makes exactly one generation call and returns its text verbatim.
    pub async fn answer(&self, question: &str, context: &[DocumentChunk]) -> AppResult<String> {
        let context_text = context
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), context_text);
        variables.insert("gradeLevel".to_string(), self.grade_level.clone());
        variables.insert("fallback".to_string(), self.prompt.fallback.clone());

        let built = build_prompt(&self.prompt, variables)?;
        let prompt_id = built.metadata.source_prompt_id;

        let mut request = LlmRequest::new(built.text, &self.model);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            "Prompt '{}' built from {} context chunks ({} bytes)",
            prompt_id,
            context.len(),
            request.prompt.len()
        );

        let response = tokio::time::timeout(self.timeout, self.client.complete(&request))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "{} did not answer within {}s",
                    self.client.provider_name(),
                    self.timeout.as_secs()
                ))
            })??;

        tracing::debug!(
            "Generation used {} tokens",
            response.usage.total_tokens
        );

        Ok(response.content)
    }
}
