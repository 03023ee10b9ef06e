//! Download request and outcome types.

use std::fmt;

use serde::Deserialize;

use super::error::DownloadError;
use crate::delivery::MediaStreamResponse;
use crate::storage::SignedLink;

/// Body of `POST /download`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadRequest {
    /// Source media URL.
    pub url: String,
}

impl DownloadRequest {
    /// Create a request for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Reject a missing or blank URL.
    ///
    /// Whether the URL is actually fetchable is left to the extractor.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::Validation` if the URL is empty after trimming.
    pub fn validate(&self) -> Result<&str, DownloadError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(DownloadError::validation("url must not be empty"));
        }
        Ok(url)
    }
}

/// Lifecycle phase of one download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    /// Request accepted by the handler.
    Received,
    /// Checking the request body.
    Validating,
    /// Extractor running inside the workspace.
    Extracting,
    /// Delivery strategy running.
    Delivering,
    /// Response produced.
    Completed,
    /// Request failed.
    Failed,
}

impl DownloadPhase {
    /// Returns the phase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validating => "validating",
            Self::Extracting => "extracting",
            Self::Delivering => "delivering",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DownloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful result of a download request.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The file was uploaded; here is where to fetch it.
    Link(SignedLink),
    /// The file bytes, to be streamed in the response body.
    Stream(MediaStreamResponse),
}
