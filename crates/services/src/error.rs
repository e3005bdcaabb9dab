//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use study_core::model::ResultError;

/// Errors emitted by quiz sessions and their orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,

    #[error("session already finalized")]
    Completed,

    #[error("slot index {index} out of range for pool of {total}")]
    SlotOutOfRange { index: usize, total: usize },

    #[error("slot {index} has not been presented yet")]
    NotPresented { index: usize },

    #[error(transparent)]
    Result(#[from] ResultError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while shaping history exports.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
