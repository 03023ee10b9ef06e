//! Core download pipeline for Audiodrop.
//!
//! This crate contains the request pipeline with ZERO web dependencies.
//!
//! # Modules
//!
//! - `workspace` - Request-scoped temporary directories with guaranteed release
//! - `extraction` - External extraction tool adapter
//! - `storage` - Object storage gateway (upload + presigned links)
//! - `delivery` - Store-and-link and stream-and-discard strategies
//! - `download` - Per-request orchestration

pub mod delivery;
pub mod download;
pub mod extraction;
pub mod storage;
pub mod workspace;
