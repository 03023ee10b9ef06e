//! Error-to-HTTP mapping.

use audiodrop_core::download::DownloadError;
use audiodrop_shared::AppError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error returned by handlers.
///
/// Rendered as `{"detail": "<cause>"}` with the status of the wrapped
/// [`AppError`]. The cause text is diagnostic only.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DownloadError> for ApiError {
    fn from(err: DownloadError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, Json(json!({ "detail": self.0.detail() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::InvalidBody("missing field `url`".into()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(AppError::Validation("url must not be empty".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::Extraction("Unsupported URL".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AppError::Storage("bucket missing".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(AppError::Internal("disk full".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[tokio::test]
    async fn test_error_response_shape(#[case] err: AppError, #[case] expected: StatusCode) {
        let detail = err.detail().to_string();

        let response = ApiError(err).into_response();

        assert_eq!(response.status(), expected);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "detail": detail }));
    }
}
