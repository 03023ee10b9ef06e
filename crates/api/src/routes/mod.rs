//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod download;
pub mod health;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(download::routes())
}
