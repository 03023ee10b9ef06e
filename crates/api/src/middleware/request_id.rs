//! Request-id middleware.

use audiodrop_shared::RequestId;
use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request with a [`RequestId`].
///
/// A valid incoming `x-request-id` is kept; otherwise a new id is generated.
/// The id is stored in request extensions for handlers, attached to a
/// per-request span, and echoed on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<RequestId>().ok())
        .unwrap_or_default();

    request.extensions_mut().insert(request_id);

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri().path()
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Extension, Router, body::Body, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn echo(Extension(request_id): Extension<RequestId>) -> String {
        request_id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo))
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    async fn call(header: Option<&str>) -> (String, String) {
        let mut request = axum::http::Request::builder().uri("/");
        if let Some(value) = header {
            request = request.header(REQUEST_ID_HEADER, value);
        }
        let response = app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let echoed = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (echoed, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let (echoed, seen_by_handler) = call(None).await;
        assert!(echoed.parse::<RequestId>().is_ok());
        assert_eq!(echoed, seen_by_handler);
    }

    #[tokio::test]
    async fn test_keeps_incoming_request_id() {
        let incoming = RequestId::new().to_string();
        let (echoed, seen_by_handler) = call(Some(&incoming)).await;
        assert_eq!(echoed, incoming);
        assert_eq!(seen_by_handler, incoming);
    }

    #[tokio::test]
    async fn test_replaces_malformed_request_id() {
        let (echoed, _) = call(Some("not-a-uuid")).await;
        assert_ne!(echoed, "not-a-uuid");
        assert!(echoed.parse::<RequestId>().is_ok());
    }
}
