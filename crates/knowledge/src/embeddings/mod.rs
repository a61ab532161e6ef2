//! Embedding providers.
//!
//! The same provider must be used to build the index and to embed questions;
//! the build marker records which model produced the stored vectors.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, embed_with_timeout, EmbeddingProvider};
