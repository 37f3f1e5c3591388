use std::sync::Arc;

use axum::body::Body as AxumBody;
use http_body_util::BodyExt;
use hyper::{Request, Response, StatusCode, Uri, Version};

use super::plain_error;
use crate::{
    adapters::middleware::CorsHeaders,
    config::ProxyRule,
    core::upstream::build_target_url,
    ports::http_client::HttpClient,
};

/// Forwards requests under one prefix to one upstream origin.
///
/// One attempt per request; no retries. Request and response bodies are streamed.
pub struct ReverseProxyHandler {
    prefix: String,
    upstream: String,
    client: Arc<dyn HttpClient>,
    cors: Option<CorsHeaders>,
}

impl ReverseProxyHandler {
    pub fn new(rule: ProxyRule, client: Arc<dyn HttpClient>, cors: Option<CorsHeaders>) -> Self {
        Self {
            prefix: rule.prefix,
            upstream: rule.upstream,
            client,
            cors,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Upstream URL for an inbound request URI.
    pub fn target_url(&self, uri: &Uri) -> String {
        let path = uri.path();
        let suffix = path.strip_prefix(self.prefix.as_str()).unwrap_or(path);
        // Request URIs never carry a fragment on the server side
        build_target_url(&self.upstream, suffix, uri.query(), None)
    }

    pub async fn handle(&self, req: Request<AxumBody>) -> Response<AxumBody> {
        let target = self.target_url(req.uri());
        let method = req.method().clone();

        let uri: Uri = match target.parse() {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!("error creating proxy request for {}: {}", target, e);
                return plain_error(StatusCode::BAD_GATEWAY, "Bad Gateway");
            }
        };

        let (mut parts, body) = req.into_parts();
        parts.uri = uri;
        // The upstream connection speaks HTTP/1.1 regardless of the inbound protocol
        parts.version = Version::HTTP_11;
        let outbound = Request::from_parts(parts, body);

        let upstream_response = match self.client.send_request(outbound).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("error response from proxy {} {}: {}", method, target, e);
                return plain_error(StatusCode::BAD_GATEWAY, "Bad Gateway");
            }
        };

        let (mut parts, body) = upstream_response.into_parts();
        if let Some(cors) = &self.cors {
            cors.apply(&mut parts.headers);
        }

        let body = body.map_err(move |e| {
            tracing::error!("error copying the response from proxy {}: {}", target, e);
            e
        });
        Response::from_parts(parts, AxumBody::new(body))
    }
}
