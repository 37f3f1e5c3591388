use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::{Result, eyre::WrapErr};
use spark::{
    adapters::{Dispatcher, HttpClientAdapter, tls},
    config::{CorsConfig, ServerConfig, ServerConfigValidator, load_config},
    ports::http_client::HttpClient,
    tracing_setup::{self, LogFormat},
    utils::GracefulShutdown,
};
use tokio::task::JoinSet;

/// Serve a directory, a file or a literal string, with optional reverse proxy rules,
/// mock fixtures and CORS headers.
#[derive(Parser, Debug)]
#[clap(name = "spark", author, version, about)]
struct Args {
    /// Listening address
    #[clap(long, default_value = "0.0.0.0")]
    address: String,

    /// Listening port
    #[clap(long, default_value_t = 8080)]
    port: u16,

    /// SSL listening port
    #[clap(long = "ssl-port", default_value_t = 10433)]
    ssl_port: u16,

    /// URL path
    #[clap(long, default_value = "/")]
    path: String,

    /// Comma-separated glob patterns of files that must not be served
    #[clap(long, default_value = "")]
    deny: String,

    /// Returned HTTP status code for file and literal bodies
    #[clap(long, default_value_t = 200)]
    status: u16,

    /// SSL certificate (PEM)
    #[clap(long, default_value = "cert.pem")]
    cert: PathBuf,

    /// SSL private key (PEM)
    #[clap(long, default_value = "key.pem")]
    key: PathBuf,

    /// Comma-separated reverse proxy rules, e.g. "/api=>http://localhost:3000"
    #[clap(long, default_value = "")]
    proxy: String,

    /// Upstream timeout in seconds
    #[clap(long = "proxy-timeout", default_value_t = 5)]
    proxy_timeout: u64,

    /// Allow CORS requests from this origin (can be '*')
    #[clap(long = "cors-origin", default_value = "")]
    cors_origin: String,

    /// Allowed CORS methods
    #[clap(long = "cors-methods", default_value = "POST, GET, OPTIONS, PUT, DELETE")]
    cors_methods: String,

    /// Allowed CORS headers
    #[clap(
        long = "cors-headers",
        default_value = "Content-Type, Authorization, X-Requested-With"
    )]
    cors_headers: String,

    /// Force this Content-Type on every response
    #[clap(long = "content-type", default_value = "")]
    content_type: String,

    /// Directory of mock fixtures (METHOD[_STATUS][.ext] files)
    #[clap(long)]
    mock: Option<PathBuf>,

    /// Log output format
    #[clap(long = "log-format", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Load settings from a TOML, YAML or JSON file instead of the flags above
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Directory to serve, file to serve, or literal response body
    #[clap(default_value = ".")]
    body: String,
}

impl Args {
    fn to_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .address(&self.address)
            .port(self.port)
            .tls_port(self.ssl_port)
            .path(&self.path)
            .deny(&self.deny)
            .status(self.status)
            .tls(&self.cert, &self.key)
            .proxy(&self.proxy)
            .proxy_timeout_secs(self.proxy_timeout)
            .cors(CorsConfig {
                origin: self.cors_origin.clone(),
                methods: self.cors_methods.clone(),
                headers: self.cors_headers.clone(),
            })
            .content_type(&self.content_type)
            .mock_dir(self.mock.clone())
            .body(&self.body)
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    tracing_setup::init_tracing(args.log_format)?;

    let provider = rustls::crypto::aws_lc_rs::default_provider();
    if let Err(e) = rustls::crypto::CryptoProvider::install_default(provider) {
        tracing::debug!("A rustls crypto provider was already installed: {:?}", e);
    }

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            load_config(path)
                .wrap_err_with(|| format!("Failed to load config from {}", path.display()))?
        }
        None => args.to_config(),
    };
    ServerConfigValidator::validate(&config).wrap_err("Invalid configuration")?;
    let config = Arc::new(config);

    let http_client: Arc<dyn HttpClient> = Arc::new(
        HttpClientAdapter::new(Duration::from_secs(config.proxy_timeout_secs))
            .wrap_err("Failed to create HTTP client adapter")?,
    );
    let router = Dispatcher::from_config(&config, http_client)?.into_router();

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        signal_handler_shutdown.run_signal_handler().await;
    });

    let mut listeners = JoinSet::new();

    if tls::tls_files_present(&config.tls) {
        let addr = config.tls_listen_addr();
        let tls_config = config.tls.clone();
        let tls_router = router.clone();
        let token = graceful_shutdown.shutdown_token();
        listeners.spawn(async move {
            if let Err(e) = tls::serve_tls(addr, tls_config, tls_router, token).await {
                tracing::error!("TLS listener stopped: {:?}", e);
            }
            Ok(())
        });
    } else {
        tracing::info!(
            "TLS listener disabled: {} or {} not found",
            config.tls.cert_path.display(),
            config.tls.key_path.display()
        );
    }

    let listen = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .wrap_err_with(|| format!("Failed to bind to {listen}"))?;
    tracing::info!("Serving {} on {}{}...", config.body, listen, config.path);

    let token = graceful_shutdown.shutdown_token();
    listeners.spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                token.wait_for_shutdown().await;
            })
            .await
            .wrap_err("Server error")
    });

    while let Some(joined) = listeners.join_next().await {
        joined.wrap_err("Listener task panicked")??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
