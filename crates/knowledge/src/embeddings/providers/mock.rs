//! Offline embedding provider based on hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use std::collections::HashMap;
use tutor_core::AppResult;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "why",
];

/// Deterministic provider for tests and offline runs.
///
/// Words are lowercased and stripped of punctuation; each word adds weight to
/// the buckets of its character trigrams and of the whole word. The result is
/// normalized to unit length, so texts sharing vocabulary score high under
/// cosine similarity. Empty text maps to the zero vector.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return vector;
        }

        for (word, freq) in word_frequencies(text) {
            let chars: Vec<char> = word.chars().collect();
            for trigram in chars.windows(3) {
                let key: String = trigram.iter().collect();
                vector[bucket(&key, 37, self.dimensions)] += (freq as f32).sqrt();
            }
            vector[bucket(&word, 31, self.dimensions)] += freq as f32;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }

        vector
    }
}

fn word_frequencies(text: &str) -> HashMap<String, u32> {
    let mut freq = HashMap::new();

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.as_str()))
    {
        *freq.entry(word).or_insert(0) += 1;
    }

    freq
}

fn bucket(key: &str, multiplier: u64, dimensions: usize) -> usize {
    let hash = key
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
    (hash % dimensions as u64) as usize
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}
