use std::path::{Path, PathBuf};

use axum::body::Body as AxumBody;
use hyper::{Request, Response, StatusCode, header, header::HeaderValue, http::request::Parts};
use thiserror::Error;

use super::plain_error;
use crate::core::{
    MockResolution,
    mock::{FixtureName, content_type_for_extension, is_verb_file, resolve_fixture},
    sniff::detect_content_type,
};

#[derive(Error, Debug)]
pub enum MockError {
    #[error("Mock endpoint directory not found: {0}")]
    EndpointNotFound(PathBuf),

    #[error("Error reading mock directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error reading mock file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl MockError {
    fn into_response(self) -> Response<AxumBody> {
        match self {
            MockError::EndpointNotFound(_) => {
                plain_error(StatusCode::NOT_FOUND, "404 page not found")
            }
            MockError::DirectoryRead { .. } | MockError::FileRead { .. } => {
                tracing::error!("{}", self);
                plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

/// Serves canned responses from one endpoint directory of the fixture tree.
#[derive(Debug, Clone)]
pub struct MockHandler {
    root: PathBuf,
    endpoint: String,
}

impl MockHandler {
    /// `endpoint` is the URL path of the endpoint directory, relative to `root`.
    pub fn new(root: impl Into<PathBuf>, endpoint: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn handle(&self, req: Request<AxumBody>) -> Response<AxumBody> {
        // Fixtures never look at the request body
        let (parts, _body) = req.into_parts();
        match self.resolve(&parts).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        }
    }

    async fn resolve(&self, req: &Parts) -> Result<Response<AxumBody>, MockError> {
        let path = req.uri.path();
        let suffix = path.strip_prefix(self.endpoint.as_str()).unwrap_or(path);
        let dir = self.endpoint_dir(suffix)?;

        match tokio::fs::metadata(&dir).await {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(MockError::EndpointNotFound(dir)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MockError::EndpointNotFound(dir));
            }
            Err(source) => return Err(MockError::DirectoryRead { path: dir, source }),
        }

        let file_names = list_fixture_files(&dir)
            .await
            .map_err(|source| MockError::DirectoryRead {
                path: dir.clone(),
                source,
            })?;

        match resolve_fixture(file_names.iter().map(String::as_str), &req.method) {
            MockResolution::MethodNotAllowed { allowed } => {
                let mut response =
                    plain_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
                if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                Ok(response)
            }
            MockResolution::Matched { file_name, status } => {
                let file_path = dir.join(&file_name);
                let content = tokio::fs::read(&file_path)
                    .await
                    .map_err(|source| MockError::FileRead {
                        path: file_path.clone(),
                        source,
                    })?;

                let content_type = FixtureName::parse(&file_name)
                    .extension()
                    .and_then(content_type_for_extension)
                    .unwrap_or_else(|| detect_content_type(&content));

                tracing::debug!(
                    "Mock {} {} -> {} ({})",
                    req.method,
                    path,
                    file_path.display(),
                    status
                );

                let mut response = Response::new(AxumBody::from(content));
                *response.status_mut() = status;
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
                Ok(response)
            }
        }
    }

    /// Directory for the request: the endpoint directory plus any extra path segments.
    fn endpoint_dir(&self, suffix: &str) -> Result<PathBuf, MockError> {
        let mut dir = self.root.clone();
        for segment in self
            .endpoint
            .split('/')
            .chain(suffix.split('/'))
            .filter(|s| !s.is_empty() && *s != ".")
        {
            let decoded = urlencoding::decode(segment)
                .map_err(|_| MockError::EndpointNotFound(dir.join(segment)))?;
            if decoded == ".." || decoded.contains(['/', '\\', '\0']) {
                return Err(MockError::EndpointNotFound(dir.join(segment)));
            }
            dir.push(decoded.as_ref());
        }
        Ok(dir)
    }
}

/// Regular, non-hidden files directly inside `dir`, sorted by name.
async fn list_fixture_files(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let is_file = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Find every directory below `root` holding at least one verb-named file and return
/// their URL paths (`/` + path relative to `root`), sorted.
///
/// Unreadable directories are skipped. A missing root yields no endpoints.
pub fn discover_endpoints(root: &Path) -> Vec<String> {
    if !root.is_dir() {
        tracing::warn!("Warning: mock directory does not exist: {}", root.display());
        return Vec::new();
    }

    let mut endpoints = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping unreadable mock directory {}: {}", dir.display(), e);
                continue;
            }
        };

        let mut has_verb_files = false;
        for entry in entries.flatten() {
            // Symlinked directories are not followed
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                pending.push(entry.path());
            } else if entry.file_name().to_str().is_some_and(is_verb_file) {
                has_verb_files = true;
            }
        }

        if has_verb_files && dir != root {
            if let Some(endpoint) = url_path(root, &dir) {
                tracing::info!("Registered mock endpoint: {}", endpoint);
                endpoints.push(endpoint);
            }
        }
    }

    endpoints.sort();
    endpoints
}

fn url_path(root: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(root).ok()?;
    let segments: Option<Vec<&str>> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect();
    Some(format!("/{}", segments?.join("/")))
}
