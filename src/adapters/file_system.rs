use std::path::{Path, PathBuf};

use axum::body::Body as AxumBody;
use hyper::{Request, Response, StatusCode, header};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::{
    adapters::{handlers::plain_error, middleware::FallbackContentType},
    core::DenyList,
    ports::file_system::{FileSystem, FileSystemError, FileSystemResult},
};

const INDEX_FILE: &str = "index.html";

/// Directory-backed file system adapter.
///
/// Every path is checked against the deny list before anything is opened. Regular
/// files are served by tower-http `ServeDir` (ranges, conditional requests, mime
/// guessing); directories serve their `index.html` or a listing that omits denied
/// entries.
#[derive(Debug, Clone)]
pub struct FileSystemAdapter {
    root: PathBuf,
    deny: DenyList,
}

impl FileSystemAdapter {
    pub fn new(root: impl Into<PathBuf>, deny: DenyList) -> Self {
        Self {
            root: root.into(),
            deny,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decode a request path into filesystem-safe segments.
    fn decode_segments(path: &str) -> FileSystemResult<Vec<String>> {
        let mut segments = Vec::new();
        for raw in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            let decoded = urlencoding::decode(raw)
                .map_err(|_| FileSystemError::InvalidPath(path.to_string()))?;
            if decoded == ".." || decoded.contains(['/', '\\', '\0']) {
                return Err(FileSystemError::InvalidPath(path.to_string()));
            }
            if decoded != "." {
                segments.push(decoded.into_owned());
            }
        }
        Ok(segments)
    }

    fn check_access(&self, relative: &str) -> FileSystemResult<()> {
        if self.deny.is_denied(relative) {
            return Err(FileSystemError::AccessDenied(relative.to_string()));
        }
        Ok(())
    }

    async fn serve_with_serve_dir(
        &self,
        path: &str,
        req: Request<AxumBody>,
    ) -> FileSystemResult<Response<AxumBody>> {
        let uri_string = format!("/{}", path.trim_start_matches('/'));
        let uri = hyper::Uri::try_from(uri_string)
            .map_err(|e| FileSystemError::InvalidPath(e.to_string()))?;

        let (parts, body) = req.into_parts();
        let mut new_req = Request::from_parts(parts, body);
        *new_req.uri_mut() = uri;

        let response = match ServeDir::new(&self.root).oneshot(new_req).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        let (parts, tower_body) = response.into_parts();
        let mut response = Response::from_parts(parts, AxumBody::new(tower_body));
        response.extensions_mut().insert(FallbackContentType);
        Ok(response)
    }

    async fn render_listing(&self, relative: &str, dir: &Path) -> FileSystemResult<String> {
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if self.deny.denies_segment(&name) {
                continue;
            }
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push(if is_dir { format!("{name}/") } else { name });
        }
        entries.sort();

        tracing::debug!("Listing {} ({} entries)", relative, entries.len());

        let mut html = String::from(
            "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
        );
        for name in &entries {
            html.push_str(&format!(
                "<a href=\"{}\">{}</a>\n",
                urlencoding::encode(name).replace("%2F", "/"),
                escape_html(name)
            ));
        }
        html.push_str("</pre>\n");
        Ok(html)
    }
}

impl FileSystem for FileSystemAdapter {
    async fn serve_path(
        &self,
        path: &str,
        req: Request<AxumBody>,
    ) -> FileSystemResult<Response<AxumBody>> {
        let segments = Self::decode_segments(path)?;
        let relative = format!("/{}", segments.join("/"));
        self.check_access(&relative)?;

        let full_path = segments.iter().fold(self.root.clone(), |p, s| p.join(s));
        let metadata = match tokio::fs::metadata(&full_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(not_found()),
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_dir() {
            return self.serve_with_serve_dir(path, req).await;
        }

        if !req.uri().path().ends_with('/') {
            return Ok(redirect_to_directory(req.uri()));
        }

        let index_path = full_path.join(INDEX_FILE);
        if tokio::fs::metadata(&index_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            let index_relative = format!("{}/{INDEX_FILE}", relative.trim_end_matches('/'));
            self.check_access(&index_relative)?;
            // ServeDir resolves a trailing-slash path to its index file
            return self.serve_with_serve_dir(path, req).await;
        }

        let html = self.render_listing(&relative, &full_path).await?;
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
            .body(AxumBody::from(html))
            .map_err(|e| FileSystemError::IoError(std::io::Error::other(e)))
    }
}

/// Relative redirect from `/dir` to `dir/`, keeping the query string.
fn redirect_to_directory(uri: &hyper::Uri) -> Response<AxumBody> {
    let last = uri.path().rsplit('/').next().unwrap_or_default();
    let location = match uri.query() {
        Some(query) => format!("{last}/?{query}"),
        None => format!("{last}/"),
    };
    let mut response = Response::new(AxumBody::empty());
    *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
    if let Ok(value) = header::HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

fn not_found() -> Response<AxumBody> {
    plain_error(StatusCode::NOT_FOUND, "404 page not found")
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    use super::*;

    async fn create_test_file(dir: &TempDir, path: &str, content: &str) -> std::io::Result<()> {
        let full_path = dir.path().join(path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(full_path, content).await
    }

    fn get(uri: &str) -> Request<AxumBody> {
        Request::builder().uri(uri).body(AxumBody::empty()).unwrap()
    }

    async fn body_string(response: Response<AxumBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_serves_file() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "hello.txt", "Hello, world!")
            .await
            .unwrap();
        let fs = FileSystemAdapter::new(temp_dir.path(), DenyList::default());

        let response = fs.serve_path("/hello.txt", get("/hello.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.extensions().get::<FallbackContentType>().is_some());
        assert_eq!(body_string(response).await, "Hello, world!");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let fs = FileSystemAdapter::new(temp_dir.path(), DenyList::default());

        let response = fs.serve_path("/nope.txt", get("/nope.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_denied_paths_are_rejected_before_reading() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, ".git/config", "secret")
            .await
            .unwrap();
        create_test_file(&temp_dir, "keys/server.key", "secret")
            .await
            .unwrap();
        let fs = FileSystemAdapter::new(temp_dir.path(), DenyList::parse(".git,*.key"));

        let result = fs.serve_path("/.git/config", get("/.git/config")).await;
        assert!(matches!(result, Err(FileSystemError::AccessDenied(_))));

        let result = fs
            .serve_path("/keys/server.key", get("/keys/server.key"))
            .await;
        assert!(matches!(result, Err(FileSystemError::AccessDenied(_))));

        // Percent-encoding does not bypass the filter
        let result = fs.serve_path("/%2Egit/config", get("/%2Egit/config")).await;
        assert!(matches!(result, Err(FileSystemError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_protection() {
        let temp_dir = TempDir::new().unwrap();
        let fs = FileSystemAdapter::new(temp_dir.path(), DenyList::default());

        let result = fs.serve_path("/../etc/passwd", get("/")).await;
        assert!(matches!(result, Err(FileSystemError::InvalidPath(_))));

        let result = fs.serve_path("/%2e%2e/etc/passwd", get("/")).await;
        assert!(matches!(result, Err(FileSystemError::InvalidPath(_))));

        let result = fs.serve_path("/a%2Fb", get("/")).await;
        assert!(matches!(result, Err(FileSystemError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "docs/a.txt", "a").await.unwrap();
        let fs = FileSystemAdapter::new(temp_dir.path(), DenyList::default());

        let response = fs
            .serve_path("/docs", get("/static/docs?x=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[header::LOCATION], "docs/?x=1");
    }

    #[tokio::test]
    async fn test_directory_listing_omits_denied_entries() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "b.txt", "b").await.unwrap();
        create_test_file(&temp_dir, "a <1>.txt", "a").await.unwrap();
        create_test_file(&temp_dir, "sub/c.txt", "c").await.unwrap();
        create_test_file(&temp_dir, ".env", "SECRET=1").await.unwrap();
        let fs = FileSystemAdapter::new(temp_dir.path(), DenyList::parse(".env"));

        let response = fs.serve_path("/", get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );

        let html = body_string(response).await;
        assert!(html.contains("<a href=\"a%20%3C1%3E.txt\">a &lt;1&gt;.txt</a>"));
        assert!(html.contains("<a href=\"b.txt\">b.txt</a>"));
        assert!(html.contains("<a href=\"sub/\">sub/</a>"));
        assert!(!html.contains(".env"));
        assert!(html.find("a%20").unwrap() < html.find("b.txt").unwrap());
    }

    #[tokio::test]
    async fn test_directory_index_is_served() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(&temp_dir, "site/index.html", "<h1>home</h1>")
            .await
            .unwrap();
        let fs = FileSystemAdapter::new(temp_dir.path(), DenyList::default());

        let response = fs.serve_path("/site/", get("/site/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "<h1>home</h1>");

        let denying = FileSystemAdapter::new(temp_dir.path(), DenyList::parse("index.html"));
        let result = denying.serve_path("/site/", get("/site/")).await;
        assert!(matches!(result, Err(FileSystemError::AccessDenied(_))));
    }
}
