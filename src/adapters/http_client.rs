use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use futures_util::stream;
use http_body_util::{BodyExt, StreamBody};
use hyper::{Request, Response, header, header::HeaderValue};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::{Instant, timeout_at};
use tracing::Instrument;

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

/// Upstream HTTP client using Hyper with Rustls (plain HTTP and HTTPS upstreams).
///
/// Every request is a single attempt bounded by `request_timeout`, measured from the
/// moment it is sent until the last byte of the response body. The body is handed back
/// as a live stream that fails once the deadline passes. The `Host` header is rewritten
/// to the upstream authority and all other headers pass through untouched.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
    request_timeout: Duration,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::debug!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        Ok(Self {
            client,
            request_timeout,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Point the `Host` header at the upstream named in the request URI.
    fn set_host_header(req: &mut Request<AxumBody>) -> HttpClientResult<()> {
        let Some(host) = req.uri().host() else {
            return Err(HttpClientError::InvalidRequest(format!(
                "Outgoing URI has no host: {}",
                req.uri()
            )));
        };
        let value = match req.uri().port_u16() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let value = HeaderValue::from_str(&value)
            .map_err(|e| HttpClientError::InvalidRequest(e.to_string()))?;
        req.headers_mut().insert(header::HOST, value);
        Ok(())
    }

    /// Stream `body` until `deadline`, then end it with a timeout error.
    fn with_deadline(&self, body: AxumBody, deadline: Instant) -> AxumBody {
        let secs = self.request_timeout.as_secs();
        let frames = stream::unfold(Some(body), move |body| async move {
            let mut body = body?;
            match timeout_at(deadline, body.frame()).await {
                Ok(Some(Ok(frame))) => Some((Ok(frame), Some(body))),
                Ok(Some(Err(e))) => Some((Err(e), None)),
                Ok(None) => None,
                Err(_) => Some((Err(axum::Error::new(HttpClientError::Timeout(secs))), None)),
            }
        });
        AxumBody::new(StreamBody::new(frames))
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        Self::set_host_header(&mut req)?;

        let method = req.method().clone();
        let uri = req.uri().clone();

        let span = tracing::info_span!(
            "upstream_request",
            http.method = %method,
            upstream.url = %uri,
            http.status_code = tracing::field::Empty,
        );
        tracing::debug!(parent: &span, "Outgoing request headers: {:?}", req.headers());

        let deadline = Instant::now() + self.request_timeout;
        let result = timeout_at(deadline, self.client.request(req))
            .instrument(span.clone())
            .await;

        match result {
            Ok(Ok(response)) => {
                span.record("http.status_code", response.status().as_u16());

                let (mut parts, hyper_body) = response.into_parts();
                // The body is re-framed by the local server
                parts.headers.remove(header::TRANSFER_ENCODING);

                let body = self.with_deadline(AxumBody::new(hyper_body), deadline);
                Ok(Response::from_parts(parts, body))
            }
            Ok(Err(e)) => Err(HttpClientError::ConnectionError(format!(
                "Request to {method} {uri} failed: {e}"
            ))),
            Err(_) => Err(HttpClientError::Timeout(self.request_timeout.as_secs())),
        }
    }
}
