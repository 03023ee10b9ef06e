//! Download orchestration.
//!
//! Drives one request through
//! `Received → Validating → Extracting → Delivering → {Completed | Failed}`:
//!
//! ```text
//! DownloadRequest ──► validate ──► acquire Workspace ──► Extractor::extract
//!                                                            │
//!                                   ┌────────────────────────┴──────────┐
//!                                   ▼                                   ▼
//!                      StoreAndLink::deliver                StreamAndDiscard::deliver
//!                      (release after delivery)             (release when stream ends)
//! ```

mod error;
mod service;
mod types;

pub use error::DownloadError;
pub use service::DownloadService;
pub use types::{DownloadOutcome, DownloadPhase, DownloadRequest};
