//! Text chunking with configurable size and overlap.

use crate::types::{ChunkMetadata, DocumentChunk, Page};

/// A character window over a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    /// Character offset of the first character
    pub start: usize,

    /// Character offset one past the last character
    pub end: usize,

    pub text: String,
}

/// Split text into overlapping character windows.
///
/// Windows are `chunk_size` characters long and start every
/// `chunk_size - overlap` characters; the last window may be shorter. Text of
/// length L yields `ceil((L - overlap) / (chunk_size - overlap))` windows, one
/// window when `L <= chunk_size`, none when the text is empty.
///
/// Callers guarantee `overlap < chunk_size` (checked by config validation).
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextWindow> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    if len == 0 || chunk_size == 0 {
        return Vec::new();
    }

    let stride = chunk_size.saturating_sub(overlap).max(1);
    let mut windows = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(len);
        windows.push(TextWindow {
            start,
            end,
            text: chars[start..end].iter().collect(),
        });

        if end >= len {
            break;
        }
        start += stride;
    }

    windows
}

/// Split every page of a document into chunks.
///
/// Blank pages produce no chunks. Ids are `{collection}-{page}-{position}`, so
/// rebuilding from the same source yields the same id set.
pub fn chunk_pages(
    pages: &[Page],
    source: &str,
    collection: &str,
    chunk_size: usize,
    overlap: usize,
) -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();

    for page in pages.iter().filter(|p| !p.text.trim().is_empty()) {
        for (position, window) in split_text(&page.text, chunk_size, overlap)
            .into_iter()
            .enumerate()
        {
            chunks.push(DocumentChunk {
                id: format!("{}-{}-{}", collection, page.number, position),
                position,
                text: window.text,
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    page: page.number,
                    start: window.start,
                    end: window.end,
                },
            });
        }
    }

    tracing::debug!(
        "Chunked {} pages into {} chunks (size: {}, overlap: {})",
        pages.len(),
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}
