use axum::body::Body as AxumBody;
use hyper::{Request, Response};
use thiserror::Error;

/// Error type for file system operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FileSystemError {
    /// Error when encountering an IO issue
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error when path is invalid
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Error when a path segment matches the deny list
    #[error("Access denied: {0}")]
    AccessDenied(String),
}

/// Result type for file system operations
pub type FileSystemResult<T> = Result<T, FileSystemError>;

/// FileSystem defines the port (interface) for serving a directory tree
pub trait FileSystem: Send + Sync + 'static {
    /// Serve a file or directory from the file system
    ///
    /// # Arguments
    /// * `path` - The request path relative to the served root (route prefix removed)
    /// * `req` - The original HTTP request
    ///
    /// # Returns
    /// A future that resolves to the response, or an error for denied or invalid paths
    fn serve_path(
        &self,
        path: &str,
        req: Request<AxumBody>,
    ) -> impl std::future::Future<Output = FileSystemResult<Response<AxumBody>>> + Send;
}
