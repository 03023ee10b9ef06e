//! Extraction adapter: fetch remote media and produce a local audio file.
//!
//! The heavy lifting is delegated to an external tool. The [`Extractor`]
//! trait is the seam the download pipeline depends on; [`YtDlpExtractor`] is
//! the production implementation.

mod error;
mod types;
mod ytdlp;

pub use error::ExtractionError;
pub use types::{ExtractOptions, ExtractedMedia, Extractor, mime_type_for_extension};
pub use ytdlp::YtDlpExtractor;
