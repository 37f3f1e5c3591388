//! Configuration data structures for Spark.
//!
//! `ServerConfig` is built once at startup, either from command line flags or from a
//! TOML / JSON / YAML file, and is then shared read-only (`Arc<ServerConfig>`) by the
//! dispatcher and every handler. Raw list-valued settings (`proxy`, `deny`) keep their
//! comma-separated source syntax here and are parsed by the components that own them.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_tls_port() -> u16 {
    10433
}

fn default_path() -> String {
    "/".to_string()
}

fn default_status() -> u16 {
    200
}

fn default_body() -> String {
    ".".to_string()
}

fn default_proxy_timeout_secs() -> u64 {
    5
}

/// Cross-origin settings. CORS is active only when `origin` is non-empty.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CorsConfig {
    /// Value of `Access-Control-Allow-Origin` (may be `*`)
    pub origin: String,
    /// Value of `Access-Control-Allow-Methods`
    pub methods: String,
    /// Value of `Access-Control-Allow-Headers`
    pub headers: String,
}

impl CorsConfig {
    pub fn is_enabled(&self) -> bool {
        !self.origin.trim().is_empty()
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: String::new(),
            methods: "POST, GET, OPTIONS, PUT, DELETE".to_string(),
            headers: "Content-Type, Authorization, X-Requested-With".to_string(),
        }
    }
}

/// TLS certificate and key locations (PEM). The TLS listener only starts when both exist.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,
    /// URL path prefix of the primary content route
    #[serde(default = "default_path")]
    pub path: String,
    /// Comma-separated glob patterns denied in directory mode
    #[serde(default)]
    pub deny: String,
    /// Status code for single-file and literal-body responses
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub tls: TlsConfig,
    /// Comma-separated `PREFIX=>URL` reverse proxy rules
    #[serde(default)]
    pub proxy: String,
    #[serde(default = "default_proxy_timeout_secs")]
    pub proxy_timeout_secs: u64,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Content-Type forced on every response (empty disables the override)
    #[serde(default)]
    pub content_type: String,
    /// Root of the mock fixture tree
    #[serde(default)]
    pub mock_dir: Option<PathBuf>,
    /// Directory to serve, file to serve, or literal response payload
    #[serde(default = "default_body")]
    pub body: String,
}

impl ServerConfig {
    /// Create a new server configuration builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// `host:port` of the plain listener.
    pub fn listen_addr(&self) -> String {
        join_host_port(&self.address, self.port)
    }

    /// `host:port` of the TLS listener.
    pub fn tls_listen_addr(&self) -> String {
        join_host_port(&self.address, self.tls_port)
    }

    pub fn content_type_override(&self) -> Option<&str> {
        let value = self.content_type.trim();
        (!value.is_empty()).then_some(value)
    }
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            tls_port: default_tls_port(),
            path: default_path(),
            deny: String::new(),
            status: default_status(),
            tls: TlsConfig::default(),
            proxy: String::new(),
            proxy_timeout_secs: default_proxy_timeout_secs(),
            cors: CorsConfig::default(),
            content_type: String::new(),
            mock_dir: None,
            body: default_body(),
        }
    }
}

/// Builder for ServerConfig, used by the command line front end and by tests
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.config.address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn tls_port(mut self, port: u16) -> Self {
        self.config.tls_port = port;
        self
    }

    /// Set the URL path prefix of the content route
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn deny(mut self, patterns: impl Into<String>) -> Self {
        self.config.deny = patterns.into();
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.config.status = status;
        self
    }

    /// Set TLS certificate and key paths
    pub fn tls(mut self, cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        self.config.tls = TlsConfig {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        };
        self
    }

    pub fn proxy(mut self, rules: impl Into<String>) -> Self {
        self.config.proxy = rules.into();
        self
    }

    pub fn proxy_timeout_secs(mut self, secs: u64) -> Self {
        self.config.proxy_timeout_secs = secs;
        self
    }

    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.config.cors = cors;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.config.content_type = content_type.into();
        self
    }

    pub fn mock_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.mock_dir = dir;
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.config.body = body.into();
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
