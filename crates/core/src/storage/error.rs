//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
///
/// No retry happens at this layer; every error is reported once to the caller.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Local source file could not be read.
    #[error("failed to read upload source: {0}")]
    Source(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            _ => Self::Operation(err.to_string()),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Source(err.to_string())
    }
}
