//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - `POST /download` and `GET /health`
//! - Request-id middleware
//! - Error-to-HTTP mapping

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use audiodrop_core::download::DownloadService;
use audiodrop_shared::CorsConfig;
use axum::Router;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::{HeaderName, HeaderValue};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::middleware::request_id::{REQUEST_ID_HEADER, request_id_middleware};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Download pipeline.
    pub downloads: Arc<DownloadService>,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub fn new(downloads: DownloadService) -> Self {
        Self {
            downloads: Arc::new(downloads),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(cors_layer(cors))
        .with_state(state)
}

/// Build the CORS layer from the configured origins.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([CONTENT_DISPOSITION, HeaderName::from_static(REQUEST_ID_HEADER)]);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
