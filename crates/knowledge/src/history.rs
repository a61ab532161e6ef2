//! Query history store: an append-only JSON array on disk.
//!
//! Every append rewrites the whole file through a temporary file in the same
//! directory followed by an atomic rename, so a crash never leaves a truncated
//! history behind. Assumes a single writing process.

use crate::types::QueryRecord;
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tutor_core::{AppError, AppResult};

/// Characters of the answer echoed into the log by [`QueryHistory::log_query`].
const LOGGED_ANSWER_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct QueryHistory {
    path: PathBuf,
}

impl QueryHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record; the file holds every previous record plus this one.
    pub fn append(&self, record: QueryRecord) -> AppResult<()> {
        let mut records = self.read_all().map_err(|e| {
            AppError::HistoryWrite(format!("Cannot read existing history: {}", e))
        })?;
        records.push(record);
        self.write_all(&records)
    }

    /// Every record in insertion order; empty when nothing was persisted yet.
    pub fn read_all(&self) -> AppResult<Vec<QueryRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&contents)?)
    }

    /// The last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> AppResult<Vec<QueryRecord>> {
        let mut records = self.read_all()?;
        let skip = records.len().saturating_sub(n);
        Ok(records.split_off(skip))
    }

    /// Record an answered question.
    ///
    /// Write failures are logged and swallowed; the caller already has its answer.
    pub fn log_query(&self, question: &str, answer: &str, metadata: serde_json::Value) {
        let preview: String = answer.chars().take(LOGGED_ANSWER_CHARS).collect();
        tracing::info!("Query: {}", question);
        tracing::info!("Answer: {}...", preview);

        let record = QueryRecord {
            timestamp: Local::now().to_rfc3339(),
            question: question.to_string(),
            answer: answer.to_string(),
            metadata: if metadata.is_null() {
                serde_json::json!({})
            } else {
                metadata
            },
        };

        if let Err(e) = self.append(record) {
            tracing::error!("Failed to save query history to {:?}: {}", self.path, e);
        }
    }

    /// Log a failed or rejected question.
    pub fn log_error(&self, message: &str, context: Option<&str>) {
        tracing::error!("Error: {}", message);
        if let Some(context) = context {
            tracing::error!("Context: {}", context);
        }
    }

    fn write_all(&self, records: &[QueryRecord]) -> AppResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        fs::create_dir_all(&dir).map_err(|e| {
            AppError::HistoryWrite(format!("Failed to create history directory {:?}: {}", dir, e))
        })?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| {
            AppError::HistoryWrite(format!("Failed to create temporary history file: {}", e))
        })?;

        serde_json::to_writer_pretty(&mut tmp, records)
            .map_err(|e| AppError::HistoryWrite(format!("Failed to serialize history: {}", e)))?;
        tmp.flush()
            .map_err(|e| AppError::HistoryWrite(format!("Failed to write history: {}", e)))?;

        tmp.persist(&self.path).map_err(|e| {
            AppError::HistoryWrite(format!("Failed to replace {:?}: {}", self.path, e.error))
        })?;

        tracing::debug!("Saved {} history records to {:?}", records.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(question: &str) -> QueryRecord {
        QueryRecord {
            timestamp: Local::now().to_rfc3339(),
            question: question.to_string(),
            answer: format!("answer to {}", question),
            metadata: serde_json::json!({"model": "deepseek-r1:1.5b", "pdf": "jesc101.pdf"}),
        }
    }

    #[test]
    fn test_read_all_missing_file() {
        let dir = TempDir::new().unwrap();
        let history = QueryHistory::new(dir.path().join("query_history.json"));
        assert!(history.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_then_read_all() {
        let dir = TempDir::new().unwrap();
        let history = QueryHistory::new(dir.path().join("logs/query_history.json"));

        history.append(record("first")).unwrap();
        let before = history.read_all().unwrap().len();

        let last = record("What is rancidity?");
        history.append(last.clone()).unwrap();

        let records = history.read_all().unwrap();
        assert_eq!(records.len(), before + 1);
        assert_eq!(records.last(), Some(&last));
    }

    #[test]
    fn test_sequential_appends_keep_every_record() {
        let dir = TempDir::new().unwrap();
        let history = QueryHistory::new(dir.path().join("query_history.json"));

        history.append(record("one")).unwrap();
        history.append(record("two")).unwrap();

        let questions: Vec<String> = history
            .read_all()
            .unwrap()
            .into_iter()
            .map(|r| r.question)
            .collect();
        assert_eq!(questions, vec!["one", "two"]);
    }

    #[test]
    fn test_file_is_pretty_printed_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("query_history.json");
        let history = QueryHistory::new(&path);

        history.append(record("format")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n  {"));
        assert!(raw.contains("\"question\": \"format\""));
    }

    #[test]
    fn test_recent_returns_last_n_oldest_first() {
        let dir = TempDir::new().unwrap();
        let history = QueryHistory::new(dir.path().join("query_history.json"));

        for q in ["a", "b", "c", "d"] {
            history.append(record(q)).unwrap();
        }

        let recent: Vec<String> = history
            .recent(2)
            .unwrap()
            .into_iter()
            .map(|r| r.question)
            .collect();
        assert_eq!(recent, vec!["c", "d"]);
        assert_eq!(history.recent(10).unwrap().len(), 4);
    }

    #[test]
    fn test_log_query_swallows_write_errors() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let history = QueryHistory::new(blocker.join("query_history.json"));
        history.log_query("q", "a", serde_json::json!({}));

        assert!(matches!(
            history.append(record("q")),
            Err(AppError::HistoryWrite(_))
        ));
    }

    #[test]
    fn test_record_without_metadata_is_rewritten_as_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("query_history.json");
        fs::write(
            &path,
            r#"[{"timestamp":"2024-05-01T10:00:00+05:30","question":"old","answer":"a"}]"#,
        )
        .unwrap();

        let history = QueryHistory::new(&path);
        history.append(record("new")).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["metadata"], serde_json::json!({}));
        assert_eq!(raw[1]["question"], "new");
    }

    #[test]
    fn test_log_query_persists_record() {
        let dir = TempDir::new().unwrap();
        let history = QueryHistory::new(dir.path().join("query_history.json"));

        history.log_query(
            "What is the chemical formula for water?",
            "H2O",
            serde_json::json!({"model": "m", "pdf": "p.pdf"}),
        );

        let records = history.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answer, "H2O");
        assert_eq!(records[0].metadata["pdf"], "p.pdf");
    }
}
