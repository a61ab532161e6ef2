//! Error types for the science tutor.
//!
//! This module defines a unified error enum covering every failure category
//! of the question-answering pipeline plus the ambient concerns around it
//! (configuration, I/O, prompts, serialization).

use thiserror::Error;

/// Unified error type for the science tutor.
///
/// All fallible functions return `Result<T, AppError>`. Every error is scoped
/// to a single request once the process has started; callers branch on
/// [`AppError::kind`] rather than on message text.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source document could not be loaded
    #[error("Document error: {0}")]
    Document(String),

    /// Vector index missing, unreadable or not writable
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Embedding provider failed or timed out
    #[error("Embedding failure: {0}")]
    Embedding(String),

    /// Text generation failed or timed out
    #[error("Generation failure: {0}")]
    Generation(String),

    /// Query history could not be persisted
    #[error("History write failure: {0}")]
    HistoryWrite(String),

    /// A blank question was submitted
    #[error("Empty input: please enter a question")]
    EmptyInput,

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Failure category of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    Document,
    IndexUnavailable,
    EmbeddingFailure,
    GenerationFailure,
    HistoryWriteFailure,
    EmptyInput,
    Prompt,
    Serialization,
    Other,
}

impl AppError {
    /// Get the failure category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Document(_) => ErrorKind::Document,
            Self::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            Self::Embedding(_) => ErrorKind::EmbeddingFailure,
            Self::Generation(_) => ErrorKind::GenerationFailure,
            Self::HistoryWrite(_) => ErrorKind::HistoryWriteFailure,
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::Prompt(_) => ErrorKind::Prompt,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AppError::EmptyInput.kind(), ErrorKind::EmptyInput);
        assert_eq!(
            AppError::Generation("timeout".to_string()).kind(),
            ErrorKind::GenerationFailure
        );
        assert_eq!(
            AppError::HistoryWrite("disk full".to_string()).kind(),
            ErrorKind::HistoryWriteFailure
        );
    }

    #[test]
    fn test_io_conversion() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_json_conversion() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
