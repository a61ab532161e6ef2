//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One page of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 0-based page number
    pub number: usize,

    /// Extracted page text
    pub text: String,
}

/// Where a chunk came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document path
    pub source: String,

    /// 0-based page number
    pub page: usize,

    /// Character offset of the first character within the page
    pub start: usize,

    /// Character offset one past the last character within the page
    pub end: usize,
}

/// A bounded span of the source document. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Deterministic identifier: `{collection}-{page}-{position}`
    pub id: String,

    /// Position of the chunk within its page
    pub position: usize,

    /// Chunk text
    pub text: String,

    /// Source location
    pub metadata: ChunkMetadata,
}

/// A chunk paired with its embedding, ready for insertion into the index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// Proof that a collection was built completely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildMarker {
    /// Number of chunks written by the build
    pub chunk_count: usize,

    /// Embedding model used for every stored vector
    pub embedding_model: String,

    /// Length of every stored vector
    pub dimensions: usize,

    /// When the build committed
    pub built_at: DateTime<Utc>,
}

/// One answered question, as persisted in the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// ISO-8601 local time with offset
    pub timestamp: String,

    pub question: String,

    pub answer: String,

    /// Free-form details (model, source document); always a JSON object
    #[serde(default = "empty_metadata", deserialize_with = "metadata_object")]
    pub metadata: serde_json::Value,
}

fn empty_metadata() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Reads missing or `null` metadata as an empty object.
fn metadata_object<'de, D>(deserializer: D) -> Result<serde_json::Value, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => empty_metadata(),
        Some(value) => value,
    })
}

/// Transient per-query state.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub question: String,
    pub context: Vec<DocumentChunk>,
    pub answer: String,
}

/// Index diagnostics shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDetails {
    /// Absolute location of the persisted index
    pub location: PathBuf,

    /// Number of stored chunks
    pub document_count: usize,

    /// First few stored ids
    pub sample_ids: Vec<String>,

    /// Error encountered while reading the index, if any
    pub error: Option<String>,
}

/// Options for [`crate::builder::ensure_index`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Drop the collection before building
    pub rebuild: bool,
}
