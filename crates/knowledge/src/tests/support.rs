//! Shared fakes and fixtures.

use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;
use tutor_core::{AppConfig, AppError, AppResult};
use tutor_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};

pub const FALLBACK: &str = "I'm not sure about that from this text.";

pub const WATER: &str = "Water, H2O, is formed of two hydrogen atoms and one oxygen atom.";
pub const MAGNESIUM: &str =
    "Magnesium ribbon burns with a dazzling white flame and forms magnesium oxide.";
pub const RANCIDITY: &str =
    "Rancidity is the oxidation of fats and oils in food, which changes smell and taste.";

/// Write a three-page textbook into `dir` and return a config pointing at it.
pub fn textbook_config(dir: &TempDir) -> AppConfig {
    write_source(dir.path(), "book.txt", &format!("{}\u{c}{}\u{c}{}", WATER, MAGNESIUM, RANCIDITY));

    AppConfig {
        workspace: dir.path().to_path_buf(),
        pdf_path: "book.txt".into(),
        embedding_provider: "mock".to_string(),
        chunk_size: 200,
        chunk_overlap: 20,
        collection_name: "test_docs".to_string(),
        ..AppConfig::default()
    }
}

pub fn write_source(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

/// Mock embeddings that count how many texts were embedded.
#[derive(Debug)]
pub struct CountingEmbedder {
    inner: MockProvider,
    pub embedded: AtomicUsize,
    /// Fail once this many texts have been embedded
    pub fail_after: Option<usize>,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self {
            inner: MockProvider::new(2048),
            embedded: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    pub fn failing_after(limit: usize) -> Self {
        Self {
            fail_after: Some(limit),
            ..Self::new()
        }
    }

    pub fn embedded(&self) -> usize {
        self.embedded.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn provider_name(&self) -> &str {
        "counting"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let before = self.embedded.fetch_add(texts.len(), Ordering::SeqCst);
        if let Some(limit) = self.fail_after {
            if before + texts.len() > limit {
                return Err(AppError::Embedding("embedding server went away".to_string()));
            }
        }
        self.inner.embed_batch(texts).await
    }
}

/// Generation fake that answers from the prompt's context section.
///
/// Returns the first context line sharing a word with the question, or the
/// fallback line when nothing matches.
#[derive(Default)]
pub struct ScriptedLlm {
    pub prompts: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn answer_from(prompt: &str) -> String {
        let (head, tail) = prompt.rsplit_once("\nContext:").unwrap_or((prompt, ""));
        let context = tail.rsplit_once("\nAnswer:").map(|(c, _)| c).unwrap_or(tail);
        let question = head.rsplit_once("Question:").map(|(_, q)| q).unwrap_or("");

        let words: Vec<String> = question
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 3)
            .map(str::to_lowercase)
            .collect();

        context
            .lines()
            .map(str::trim)
            .find(|line| {
                let line = line.to_lowercase();
                words.iter().any(|w| line.contains(w.as_str()))
            })
            .map(str::to_string)
            .unwrap_or_else(|| FALLBACK.to_string())
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.requests.lock().unwrap().push(request.clone());

        Ok(LlmResponse {
            content: Self::answer_from(&request.prompt),
            model: request.model.clone(),
            usage: LlmUsage::new(0, 0),
        })
    }
}

/// Generation fake that always fails.
pub struct FailingLlm;

#[async_trait::async_trait]
impl LlmClient for FailingLlm {
    fn provider_name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::Generation("connection refused".to_string()))
    }
}
