//! Extraction error types.

use thiserror::Error;

/// Extraction failures.
///
/// Every variant means no usable media was produced. Partial files may remain
/// in the output directory and are removed with the workspace.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The extraction program could not be started.
    #[error("failed to start '{program}': {reason}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Reason reported by the OS.
        reason: String,
    },

    /// The extraction program exited unsuccessfully.
    #[error("extraction failed ({status}): {message}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Tail of the program's diagnostic output.
        message: String,
    },

    /// The program succeeded but did not report the produced file.
    #[error("extraction produced no media report")]
    MissingOutput,

    /// The reported file does not exist.
    #[error("extracted file not found: {0}")]
    FileMissing(String),

    /// Extraction exceeded the configured time limit.
    #[error("extraction timed out after {0}s")]
    TimedOut(u64),

    /// I/O error while supervising the program.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Create a spawn error.
    #[must_use]
    pub fn spawn(program: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            reason: err.to_string(),
        }
    }

    /// Create a failed-run error.
    #[must_use]
    pub fn failed(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            status: status.into(),
            message: message.into(),
        }
    }
}
