//! Audio download route.

use audiodrop_core::delivery::MediaStreamResponse;
use audiodrop_core::download::{DownloadOutcome, DownloadRequest};
use audiodrop_shared::{AppError, RequestId};
use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

/// Creates the download routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/download", post(download))
}

/// Response for link delivery.
#[derive(Debug, Serialize)]
pub struct DownloadLinkResponse {
    /// Presigned URL for the uploaded audio.
    pub url: String,
}

/// Extract audio from the requested URL and deliver it.
///
/// Returns `{"url": ...}` in link mode, or the audio bytes as an attachment
/// in stream mode.
async fn download(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidBody(e.body_text()))?;

    match state.downloads.handle(request_id, request).await? {
        DownloadOutcome::Link(link) => Ok(Json(DownloadLinkResponse { url: link.url }).into_response()),
        DownloadOutcome::Stream(media) => stream_response(media),
    }
}

/// Build a streamed attachment response. The body owns the workspace.
fn stream_response(media: MediaStreamResponse) -> Result<Response, ApiError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", media.filename),
        );
    if let Some(len) = media.content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    builder
        .body(Body::from_stream(media.stream))
        .map_err(|e| AppError::Internal(e.to_string()).into())
}
