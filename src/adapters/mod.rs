pub mod dispatcher;
pub mod file_system;
pub mod handlers;
pub mod http_client;
pub mod middleware;
pub mod tls;

/// Re-export commonly used types from adapters
pub use dispatcher::{Dispatcher, RouteHandler};
pub use file_system::FileSystemAdapter;
pub use http_client::HttpClientAdapter;
pub use middleware::{CorsAndContentType, CorsHeaders, FallbackContentType};
