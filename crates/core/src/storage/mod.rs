//! Object storage gateway using Apache OpenDAL.
//!
//! Targets any S3-compatible service: Cloudflare R2, AWS S3, MinIO,
//! DigitalOcean Spaces.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.writer_with("key")      │ op.presign_read("key", duration)   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod key;
mod service;

pub use error::StorageError;
pub use key::ObjectKey;
pub use service::{ObjectStore, SignedLink, StorageService};
