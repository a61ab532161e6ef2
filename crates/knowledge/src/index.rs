//! SQLite-backed vector index for document chunks.

use crate::types::{BuildMarker, ChunkMetadata, DocumentChunk, IndexEntry};
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tutor_core::{AppError, AppResult};

/// File name of the index database inside the persist directory.
pub const INDEX_FILE: &str = "index.sqlite";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    chunk_count INTEGER NOT NULL,
    embedding_model TEXT NOT NULL,
    dimensions INTEGER NOT NULL,
    built_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    position INTEGER NOT NULL,
    text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
"#;

/// One collection of a SQLite index file.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
    path: PathBuf,
    collection: String,
}

impl SqliteIndex {
    /// Open (creating if needed) `persist_dir/index.sqlite` for `collection`.
    pub fn open(persist_dir: &Path, collection: &str) -> AppResult<Self> {
        std::fs::create_dir_all(persist_dir).map_err(|e| {
            AppError::IndexUnavailable(format!(
                "Failed to create index directory {:?}: {}",
                persist_dir, e
            ))
        })?;

        let path = persist_dir.join(INDEX_FILE);
        let conn = Connection::open(&path).map_err(|e| {
            AppError::IndexUnavailable(format!("Failed to open SQLite index {:?}: {}", path, e))
        })?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite index at {:?} (collection '{}')", path, collection);

        Ok(Self {
            conn: Mutex::new(conn),
            path,
            collection: collection.to_string(),
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::IndexUnavailable("Index connection poisoned".to_string()))
    }
}

impl VectorIndex for SqliteIndex {
    fn insert(&self, entries: &[IndexEntry], marker: &BuildMarker) -> AppResult<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM chunks WHERE collection = ?1",
            params![self.collection],
        )
        .map_err(|e| AppError::IndexUnavailable(format!("Failed to delete stale chunks: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO chunks (collection, id, position, text, embedding, metadata)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| AppError::IndexUnavailable(format!("Failed to prepare insert: {}", e)))?;

            for entry in entries {
                let metadata = serde_json::to_string(&entry.chunk.metadata)?;
                stmt.execute(params![
                    self.collection,
                    entry.chunk.id,
                    entry.chunk.position as i64,
                    entry.chunk.text,
                    embedding_to_bytes(&entry.embedding),
                    metadata,
                ])
                .map_err(|e| {
                    AppError::IndexUnavailable(format!(
                        "Failed to insert chunk {}: {}",
                        entry.chunk.id, e
                    ))
                })?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO collections (name, chunk_count, embedding_model, dimensions, built_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.collection,
                marker.chunk_count as i64,
                marker.embedding_model,
                marker.dimensions as i64,
                marker.built_at.to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::IndexUnavailable(format!("Failed to write build marker: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to commit index build: {}", e)))?;

        tracing::info!(
            "Committed {} chunks to collection '{}'",
            entries.len(),
            self.collection
        );
        Ok(())
    }

    fn count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM chunks c
                 WHERE c.collection = ?1
                   AND EXISTS (SELECT 1 FROM collections m WHERE m.name = ?1)",
                params![self.collection],
                |row| row.get(0),
            )
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to count chunks: {}", e)))?;

        Ok(count as usize)
    }

    fn marker(&self) -> AppResult<Option<BuildMarker>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT chunk_count, embedding_model, dimensions, built_at
                 FROM collections WHERE name = ?1",
                params![self.collection],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to read build marker: {}", e)))?;

        let Some((chunk_count, embedding_model, dimensions, built_at)) = row else {
            return Ok(None);
        };

        let built_at = DateTime::parse_from_rfc3339(&built_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| AppError::IndexUnavailable(format!("Corrupt build marker: {}", e)))?;

        Ok(Some(BuildMarker {
            chunk_count: chunk_count as usize,
            embedding_model,
            dimensions: dimensions as usize,
            built_at,
        }))
    }

    fn similarity_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(DocumentChunk, f32)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, position, text, embedding, metadata FROM chunks
                 WHERE collection = ?1 ORDER BY rowid",
            )
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![self.collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to query chunks: {}", e)))?;

        let mut results = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            let (id, position, text, embedding_bytes, metadata_json) = row
                .map_err(|e| AppError::IndexUnavailable(format!("Failed to read chunk: {}", e)))?;

            let embedding = bytes_to_embedding(&embedding_bytes)?;
            let Some(score) = cosine_similarity(query_embedding, &embedding) else {
                skipped += 1;
                continue;
            };
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)?;

            results.push((
                DocumentChunk {
                    id,
                    position: position as usize,
                    text,
                    metadata,
                },
                score,
            ));
        }

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} chunks whose embeddings do not match the query length {}",
                skipped,
                query_embedding.len()
            );
        }

        // Stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{})",
            results.len(),
            top_k
        );

        Ok(results)
    }

    fn sample_ids(&self, limit: usize) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT id FROM chunks WHERE collection = ?1 ORDER BY rowid LIMIT ?2")
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to prepare query: {}", e)))?;

        let ids = stmt
            .query_map(params![self.collection, limit as i64], |row| row.get(0))
            .and_then(|rows| rows.collect::<Result<Vec<String>, _>>())
            .map_err(|e| AppError::IndexUnavailable(format!("Failed to read chunk ids: {}", e)))?;

        Ok(ids)
    }
}

/// Convert embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::IndexUnavailable(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity between two vectors; `None` when their lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Some(0.0);
    }

    Some(dot_product / (norm_a * norm_b))
}
