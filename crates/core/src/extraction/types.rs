//! Extraction types and the extractor seam.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use audiodrop_shared::{ExtractorConfig, QualitySelector};

use super::error::ExtractionError;

/// Per-request extraction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Rendition preference.
    pub quality: QualitySelector,
    /// Target audio codec (e.g. `mp3`).
    pub codec: String,
    /// Target bitrate in kbit/s.
    pub bitrate_kbps: Option<u32>,
    /// Cookie file handed to the tool unchanged.
    pub cookie_file: Option<PathBuf>,
    /// Directory the produced file is written to.
    pub output_dir: PathBuf,
}

impl ExtractOptions {
    /// Build options from process-wide configuration for one output directory.
    #[must_use]
    pub fn from_config(config: &ExtractorConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            quality: config.quality,
            codec: config.codec.clone(),
            bitrate_kbps: config.bitrate_kbps,
            cookie_file: config.cookie_file.clone(),
            output_dir: output_dir.into(),
        }
    }
}

/// A produced audio file inside a request workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMedia {
    /// Provider-assigned identifier of the source media.
    pub id: String,
    /// Location of the produced file.
    pub file_path: PathBuf,
    /// Final file extension, as produced (never assumed).
    pub extension: String,
    /// MIME type derived from the extension.
    pub mime_type: String,
}

impl ExtractedMedia {
    /// Describe a produced file. Extension and MIME type come from the path.
    #[must_use]
    pub fn new(id: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let extension = file_path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let mime_type = mime_type_for_extension(&extension).to_string();
        Self {
            id: id.into(),
            file_path,
            extension,
            mime_type,
        }
    }

    /// Get the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// MIME type for an audio file extension.
#[must_use]
pub fn mime_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "opus" | "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Fetches remote media and writes exactly one audio file into
/// [`ExtractOptions::output_dir`].
///
/// Implementations may run for minutes and must not hold any lock shared
/// between requests.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract audio from `url`.
    async fn extract(
        &self,
        url: &str,
        options: &ExtractOptions,
    ) -> Result<ExtractedMedia, ExtractionError>;
}
