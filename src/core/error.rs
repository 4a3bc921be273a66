//! Error types shared by the document model and its backend

use thiserror::Error;

/// Errors raised by the in-memory model itself
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("base path `{base}` is not a prefix of `{full}`")]
    PathMismatch { full: String, base: String },
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),
}

/// Errors reported by a [`Backend`](super::backend::Backend)
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse frontmatter in {path}: {message}")]
    Parse { path: String, message: String },
    #[error("malformed data: {0}")]
    Format(String),
    #[error("archive verification failed: {0}")]
    Verification(String),
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<tokio::task::JoinError> for BackendError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Errors surfaced by [`DocumentStore`](super::store::DocumentStore) operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
