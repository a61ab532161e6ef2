//! Crate-level tests exercising several modules together.

mod index_build;
mod rag_ranking;
mod support;
