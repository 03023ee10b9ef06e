//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// The message carried by each variant is the human-readable cause that is
/// returned to callers as `detail`. It is diagnostic text, not a stable contract.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body could not be decoded.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Fetching or transcoding the source media failed.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Uploading or signing the produced object failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidBody(_) => 422,
            Self::Validation(_) => 400,
            Self::Extraction(_) | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code used in logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBody(_) => "INVALID_BODY",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Extraction(_) => "EXTRACTION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the bare cause without the classification prefix.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidBody(msg)
            | Self::Validation(msg)
            | Self::Extraction(msg)
            | Self::Storage(msg)
            | Self::Internal(msg) => msg,
        }
    }

    /// Returns true when the error was caused by the caller.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::InvalidBody(String::new()), 422, "INVALID_BODY")]
    #[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::Extraction(String::new()), 500, "EXTRACTION_ERROR")]
    #[case(AppError::Storage(String::new()), 500, "STORAGE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_error_classification(
        #[case] err: AppError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::Extraction("msg".into()).to_string(),
            "Extraction failed: msg"
        );
        assert_eq!(
            AppError::Storage("msg".into()).to_string(),
            "Storage error: msg"
        );
        assert_eq!(
            AppError::Internal("msg".into()).to_string(),
            "Internal error: msg"
        );
    }

    #[test]
    fn test_detail_strips_prefix() {
        assert_eq!(AppError::Storage("bucket missing".into()).detail(), "bucket missing");
        assert!(AppError::Validation("x".into()).is_client_error());
        assert!(!AppError::Extraction("x".into()).is_client_error());
    }
}
