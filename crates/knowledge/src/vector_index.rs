//! Vector index abstraction for document chunks.

use crate::types::{BuildMarker, DocumentChunk, IndexEntry};
use tutor_core::AppResult;

/// Trait for vector index backends.
///
/// An index holds one collection. A collection only counts as present once a
/// build marker has been committed together with its chunks; until then
/// [`VectorIndex::count`] reports zero.
pub trait VectorIndex: Send + Sync {
    /// Replace the collection with `entries` and commit `marker` atomically.
    ///
    /// On failure the previous build, if any, is left untouched.
    fn insert(&self, entries: &[IndexEntry], marker: &BuildMarker) -> AppResult<()>;

    /// Number of chunks in a completely built collection, zero otherwise.
    fn count(&self) -> AppResult<usize>;

    /// Build marker of the collection, if one was committed.
    fn marker(&self) -> AppResult<Option<BuildMarker>>;

    /// The `top_k` chunks most similar to `query_embedding`, best first.
    ///
    /// Stored vectors whose length differs from the query are never returned.
    fn similarity_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(DocumentChunk, f32)>>;

    /// Ids of the first `limit` stored chunks, in insertion order.
    fn sample_ids(&self, limit: usize) -> AppResult<Vec<String>>;
}
