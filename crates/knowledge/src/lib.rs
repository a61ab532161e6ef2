//! Retrieval-augmented question answering over a single textbook.
//!
//! The index is built once from the source document and persisted in SQLite;
//! each question then runs through a fixed retrieve-then-generate pipeline.

pub mod answerer;
pub mod builder;
pub mod chunker;
pub mod context;
pub mod diagnostics;
pub mod embeddings;
pub mod history;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod retriever;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use answerer::Answerer;
pub use builder::{ensure_index, IndexHandle};
pub use context::TutorContext;
pub use diagnostics::index_details;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use history::QueryHistory;
pub use index::SqliteIndex;
pub use pipeline::Pipeline;
pub use retriever::Retriever;
pub use types::{
    BuildMarker, BuildOptions, ChunkMetadata, DocumentChunk, IndexDetails, IndexEntry, Page,
    PipelineState, QueryRecord,
};
pub use vector_index::VectorIndex;
