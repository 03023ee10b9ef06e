//! Shared types, errors, and configuration for Audiodrop.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for requests and workspaces
//! - Application-wide error classification
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, CorsConfig, DeliveryConfig, DeliveryMode, ExtractorConfig, LogConfig, LogFormat,
    MAX_LINK_TTL_SECS, QualitySelector, ServerConfig, StorageSettings, WorkspaceConfig,
};
pub use error::{AppError, AppResult};
pub use types::{RequestId, WorkspaceId};
