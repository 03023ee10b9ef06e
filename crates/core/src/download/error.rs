//! Download orchestration errors.

use audiodrop_shared::AppError;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::storage::StorageError;
use crate::workspace::WorkspaceError;

/// Why a download request failed.
///
/// Cleanup failures never appear here; they are logged and the primary
/// outcome is kept.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request body was rejected.
    #[error("{0}")]
    Validation(String),

    /// No workspace could be set up.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Fetching or transcoding failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Upload or link signing failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The produced file could not be opened for streaming.
    #[error("failed to open extracted file: {0}")]
    StreamSetup(#[source] std::io::Error),
}

impl DownloadError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the caller is at fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<DownloadError> for AppError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Validation(msg) => Self::Validation(msg),
            DownloadError::Extraction(e) => Self::Extraction(e.to_string()),
            DownloadError::Storage(e) => Self::Storage(e.to_string()),
            e @ (DownloadError::Workspace(_) | DownloadError::StreamSetup(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}
