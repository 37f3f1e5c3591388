use axum::body::{Body as AxumBody, to_bytes};
use hyper::{Request, Response, StatusCode, header, header::HeaderValue};

use super::plain_error;
use crate::{adapters::middleware::FallbackContentType, core::echo::render_request};

/// Upper bound on the request body buffered for `/echo`.
const MAX_ECHO_BODY: usize = 16 * 1024 * 1024;

/// Diagnostic endpoint answering with a plain-text rendering of the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl EchoHandler {
    pub async fn handle(&self, req: Request<AxumBody>) -> Response<AxumBody> {
        let (parts, body) = req.into_parts();
        let body = match to_bytes(body, MAX_ECHO_BODY).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read echo request body: {}", e);
                return plain_error(StatusCode::BAD_REQUEST, "400 Bad Request");
            }
        };

        let document = render_request(&parts, &body);
        tracing::info!("{}", String::from_utf8_lossy(&document));

        let mut response = Response::new(AxumBody::from(document));
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response.extensions_mut().insert(FallbackContentType);
        response
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn test_echo_renders_request() {
        let req = Request::builder()
            .method("PUT")
            .uri("/echo?debug=1")
            .header(header::HOST, "localhost:8080")
            .body(AxumBody::from("ping"))
            .unwrap();

        let response = EchoHandler.handle(req).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("=== REQUEST ===\nMethod: PUT\nPath: /echo\nQuery: debug=1\n"));
        assert!(text.contains("host: localhost:8080\n"));
        assert!(text.ends_with("=== BODY ===\nping\n"));
    }

    #[tokio::test]
    async fn test_echo_empty_body() {
        let req = Request::builder()
            .uri("/echo")
            .body(AxumBody::empty())
            .unwrap();
        let response = EchoHandler.handle(req).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.ends_with(b"=== BODY ===\n(empty)\n"));
    }

    #[tokio::test]
    async fn test_echo_rejects_oversized_body() {
        let req = Request::builder()
            .method("POST")
            .uri("/echo")
            .body(AxumBody::from(vec![b'x'; MAX_ECHO_BODY + 1]))
            .unwrap();

        let response = EchoHandler.handle(req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
