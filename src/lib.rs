//! Spark - a single-binary HTTP front door.
//!
//! One listener (plus an optional TLS listener) multiplexes four kinds of handler
//! behind a shared CORS / content-type middleware:
//!
//! - static content: a directory tree filtered by a deny-glob list, a single file, or
//!   a literal payload given on the command line
//! - reverse proxy rules (`PREFIX=>URL`), one upstream per prefix
//! - mock endpoints discovered from a fixture tree (`METHOD[_STATUS][.ext]` files)
//! - `/echo`, which renders the incoming request as plain text
//!
//! Requests go to the route with the longest matching path prefix.
//!
//! # Quick Example
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use spark::{Dispatcher, HttpClientAdapter, config::ServerConfig};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = ServerConfig::builder()
//!     .body("./public")
//!     .proxy("/api=>http://localhost:3000")
//!     .build();
//! let client = Arc::new(HttpClientAdapter::new(Duration::from_secs(5))?);
//! let router = Dispatcher::from_config(&config, client)?.into_router();
//!
//! let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
//! axum::serve(listener, router).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! **ports** hold the traits at the I/O seams (upstream HTTP client, file serving),
//! **adapters** implement them and host the handlers, middleware and dispatcher, and
//! **core** keeps the pure logic: route table, deny list, fixture naming, content
//! sniffing, echo rendering.
//!
//! # Error Handling
//! Startup errors are `eyre::Result` with context attached. Request handling never
//! fails: handlers map their typed errors to 4xx/5xx responses and log them.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{Dispatcher, FileSystemAdapter, HttpClientAdapter},
    ports::http_client::HttpClient,
    utils::GracefulShutdown,
};
