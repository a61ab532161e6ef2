//! Index diagnostics.

use crate::types::IndexDetails;
use crate::vector_index::VectorIndex;
use std::path::Path;

/// Number of ids shown as a sample.
const SAMPLE_SIZE: usize = 3;

/// Describe the index at `location`.
///
/// Read failures are reported in [`IndexDetails::error`] instead of raised.
pub fn index_details(index: &dyn VectorIndex, location: &Path) -> IndexDetails {
    let location = location
        .canonicalize()
        .unwrap_or_else(|_| location.to_path_buf());

    let read = index
        .count()
        .and_then(|count| Ok((count, index.sample_ids(SAMPLE_SIZE)?)));

    match read {
        Ok((document_count, sample_ids)) => IndexDetails {
            location,
            document_count,
            sample_ids,
            error: None,
        },
        Err(e) => {
            tracing::warn!("Failed to read index details: {}", e);
            IndexDetails {
                location,
                document_count: 0,
                sample_ids: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}
