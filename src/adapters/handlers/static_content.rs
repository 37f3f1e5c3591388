use std::path::{Path, PathBuf};

use axum::body::Body as AxumBody;
use bytes::Bytes;
use eyre::{Result, WrapErr, eyre};
use hyper::{Request, Response, StatusCode, header, header::HeaderValue};

use super::plain_error;
use crate::{
    adapters::{FileSystemAdapter, middleware::FallbackContentType},
    core::{DenyList, sniff::detect_content_type},
    ports::file_system::{FileSystem, FileSystemError},
};

/// What the positional body argument resolved to at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    Directory(PathBuf),
    /// Contents of a regular file, read once.
    File(Bytes),
    /// The argument itself is the payload.
    Literal(Bytes),
}

impl ContentSource {
    /// Classify `body`: an existing directory, an existing regular file, or otherwise a
    /// literal payload. A file that exists but cannot be read is an error.
    pub fn resolve(body: &str) -> Result<Self> {
        let path = Path::new(body);
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(Self::Directory(path.to_path_buf())),
            Ok(metadata) if metadata.is_file() => {
                let content = std::fs::read(path)
                    .wrap_err_with(|| format!("Error reading file: {body}"))?;
                Ok(Self::File(Bytes::from(content)))
            }
            Ok(_) => Err(eyre!("{body} is neither a regular file nor a directory")),
            Err(_) => Ok(Self::Literal(Bytes::copy_from_slice(body.as_bytes()))),
        }
    }
}

enum Mode {
    Directory(FileSystemAdapter),
    Bytes {
        body: Bytes,
        content_type: &'static str,
    },
}

/// Serves the primary content route: a filtered directory tree or a fixed payload.
pub struct StaticContentHandler {
    mode: Mode,
    status: StatusCode,
}

impl StaticContentHandler {
    pub fn new(source: ContentSource, deny: DenyList, status: StatusCode) -> Self {
        let mode = match source {
            ContentSource::Directory(root) => {
                if deny.is_empty() {
                    tracing::warn!("Warning: serving files without any filter!");
                }
                Mode::Directory(FileSystemAdapter::new(root, deny))
            }
            ContentSource::File(body) | ContentSource::Literal(body) => {
                let content_type = detect_content_type(&body);
                Mode::Bytes { body, content_type }
            }
        };
        Self { mode, status }
    }

    /// Whether requests need the route prefix removed before they reach this handler.
    pub fn is_directory(&self) -> bool {
        matches!(self.mode, Mode::Directory(_))
    }

    /// Serve `req`. In directory mode `path` is the request path below the route prefix.
    pub async fn handle(&self, path: &str, req: Request<AxumBody>) -> Response<AxumBody> {
        match &self.mode {
            Mode::Directory(fs) => {
                let path = if path.starts_with('/') {
                    path.to_string()
                } else {
                    format!("/{path}")
                };
                match fs.serve_path(&path, req).await {
                    Ok(response) => response,
                    Err(e) => file_system_error_response(&path, e),
                }
            }
            Mode::Bytes { body, content_type } => {
                let mut response = Response::new(AxumBody::from(body.clone()));
                *response.status_mut() = self.status;
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
                response.extensions_mut().insert(FallbackContentType);
                response
            }
        }
    }
}

fn file_system_error_response(path: &str, error: FileSystemError) -> Response<AxumBody> {
    match error {
        FileSystemError::AccessDenied(denied) => {
            tracing::warn!("Denied access to {}", denied);
            plain_error(StatusCode::FORBIDDEN, "403 Forbidden")
        }
        FileSystemError::InvalidPath(invalid) => {
            tracing::warn!("Rejected invalid path {}", invalid);
            plain_error(StatusCode::BAD_REQUEST, "400 Bad Request")
        }
        FileSystemError::IoError(e) => match e.kind() {
            std::io::ErrorKind::NotFound => plain_error(StatusCode::NOT_FOUND, "404 page not found"),
            std::io::ErrorKind::PermissionDenied => {
                plain_error(StatusCode::FORBIDDEN, "403 Forbidden")
            }
            _ => {
                tracing::error!("Error serving {}: {}", path, e);
                plain_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500 Internal Server Error",
                )
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    use super::*;

    fn get(uri: &str) -> Request<AxumBody> {
        Request::builder().uri(uri).body(AxumBody::empty()).unwrap()
    }

    async fn body_bytes(response: Response<AxumBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_resolve_content_source() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("hello.txt");
        std::fs::write(&file, "from file").unwrap();

        assert_eq!(
            ContentSource::resolve(temp_dir.path().to_str().unwrap()).unwrap(),
            ContentSource::Directory(temp_dir.path().to_path_buf())
        );
        assert_eq!(
            ContentSource::resolve(file.to_str().unwrap()).unwrap(),
            ContentSource::File(Bytes::from_static(b"from file"))
        );
        assert_eq!(
            ContentSource::resolve("<h1>hello</h1>").unwrap(),
            ContentSource::Literal(Bytes::from_static(b"<h1>hello</h1>"))
        );
    }

    #[tokio::test]
    async fn test_literal_body_uses_configured_status_and_sniffed_type() {
        let handler = StaticContentHandler::new(
            ContentSource::Literal(Bytes::from_static(b"<h1>hello</h1>")),
            DenyList::default(),
            StatusCode::ACCEPTED,
        );
        assert!(!handler.is_directory());

        let response = handler.handle("/anything", get("/anything")).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert!(response.extensions().get::<FallbackContentType>().is_some());
        assert_eq!(&body_bytes(response).await[..], b"<h1>hello</h1>");
    }

    #[tokio::test]
    async fn test_repeated_requests_are_identical() {
        let handler = StaticContentHandler::new(
            ContentSource::File(Bytes::from_static(b"same every time")),
            DenyList::default(),
            StatusCode::OK,
        );

        let first = body_bytes(handler.handle("/", get("/")).await).await;
        let second = body_bytes(handler.handle("/", get("/")).await).await;
        assert_eq!(first, second);
        assert_eq!(&first[..], b"same every time");
    }

    #[tokio::test]
    async fn test_directory_mode_maps_errors_to_statuses() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("ok.txt"), "ok").unwrap();
        std::fs::write(temp_dir.path().join("secret.key"), "secret").unwrap();

        let handler = StaticContentHandler::new(
            ContentSource::Directory(temp_dir.path().to_path_buf()),
            DenyList::parse("*.key"),
            StatusCode::IM_A_TEAPOT,
        );
        assert!(handler.is_directory());

        let response = handler.handle("ok.txt", get("/ok.txt")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = handler.handle("/secret.key", get("/secret.key")).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_bytes(response).await;
        assert!(!String::from_utf8_lossy(&body).contains("secret\n"));
        assert_eq!(&body[..], b"403 Forbidden\n");

        let response = handler.handle("/../ok.txt", get("/")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = handler.handle("/missing.txt", get("/missing.txt")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
