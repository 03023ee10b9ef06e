//! Workspace error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Workspace lifecycle errors.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The workspace directory could not be created.
    #[error("failed to create workspace under {}: {source}", .path.display())]
    Acquire {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The workspace directory could not be removed.
    ///
    /// Logged by callers, never surfaced in a response.
    #[error("failed to remove workspace {}: {source}", .path.display())]
    Cleanup {
        /// Directory that could not be removed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl WorkspaceError {
    /// Create an acquire error.
    #[must_use]
    pub fn acquire(path: &Path, source: io::Error) -> Self {
        Self::Acquire {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a cleanup error.
    #[must_use]
    pub fn cleanup(path: &Path, source: io::Error) -> Self {
        Self::Cleanup {
            path: path.to_path_buf(),
            source,
        }
    }
}
