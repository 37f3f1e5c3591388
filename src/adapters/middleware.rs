//! CORS and content-type wrapper applied around every registered handler.
//!
//! Headers configured here behave as if they were set before the handler ran: a
//! handler that sets the same header itself wins. The content-type override is the
//! exception for handlers whose content type is only a guess (sniffed bytes, mime
//! guessing on static files); those mark their response with [`FallbackContentType`]
//! and the override replaces the guess.
use std::future::Future;

use axum::{body::Body, extract::Request, response::Response};
use eyre::{Result, WrapErr};
use hyper::{HeaderMap, Method, StatusCode, header, header::HeaderValue};

use crate::config::{CorsConfig, ServerConfig};

/// Response extension marking a content type that a configured override may replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackContentType;

/// Pre-validated CORS header values.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    origin: HeaderValue,
    methods: HeaderValue,
    headers: HeaderValue,
}

impl CorsHeaders {
    /// `None` when no origin is configured.
    pub fn from_config(config: &CorsConfig) -> Result<Option<Self>> {
        if !config.is_enabled() {
            return Ok(None);
        }
        Ok(Some(Self {
            origin: HeaderValue::from_str(config.origin.trim())
                .wrap_err("Invalid CORS origin")?,
            methods: HeaderValue::from_str(&config.methods).wrap_err("Invalid CORS methods")?,
            headers: HeaderValue::from_str(&config.headers).wrap_err("Invalid CORS headers")?,
        }))
    }

    /// Set the three CORS headers, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone());
    }

    /// Set the three CORS headers unless the response already carries them.
    fn apply_missing(&self, headers: &mut HeaderMap) {
        headers
            .entry(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .or_insert_with(|| self.origin.clone());
        headers
            .entry(header::ACCESS_CONTROL_ALLOW_METHODS)
            .or_insert_with(|| self.methods.clone());
        headers
            .entry(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .or_insert_with(|| self.headers.clone());
    }
}

#[derive(Debug, Clone, Default)]
pub struct CorsAndContentType {
    content_type: Option<HeaderValue>,
    cors: Option<CorsHeaders>,
}

impl CorsAndContentType {
    pub fn new(content_type: Option<HeaderValue>, cors: Option<CorsHeaders>) -> Self {
        Self { content_type, cors }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let content_type = config
            .content_type_override()
            .map(HeaderValue::from_str)
            .transpose()
            .wrap_err("Invalid content type override")?;
        Ok(Self::new(content_type, CorsHeaders::from_config(&config.cors)?))
    }

    pub fn cors(&self) -> Option<&CorsHeaders> {
        self.cors.as_ref()
    }

    /// Run `next` for `req`, answering CORS preflights without calling it.
    pub async fn run<F, Fut>(&self, req: Request, next: F) -> Response
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        if let Some(cors) = &self.cors {
            if req.method() == Method::OPTIONS {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::OK;
                cors.apply(response.headers_mut());
                if let Some(content_type) = &self.content_type {
                    response
                        .headers_mut()
                        .insert(header::CONTENT_TYPE, content_type.clone());
                }
                return response;
            }
        }

        let mut response = next(req).await;

        if let Some(content_type) = &self.content_type {
            let replaceable = !response.headers().contains_key(header::CONTENT_TYPE)
                || response.extensions().get::<FallbackContentType>().is_some();
            if replaceable {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, content_type.clone());
            }
        }
        if let Some(cors) = &self.cors {
            cors.apply_missing(response.headers_mut());
        }

        response
    }
}
