//! Best-effort TLS listener serving the same router as the plain listener.
use std::{fs::File, io::BufReader, net::SocketAddr, path::Path, sync::Arc};

use axum::{Router, serve::Listener};
use eyre::{Result, WrapErr, eyre};
use futures_util::StreamExt;
use rustls_pemfile::{certs, private_key};
use tls_listener::TlsListener;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{config::TlsConfig, utils::ShutdownToken};

/// Adapts an accept stream to axum's [`Listener`]. Failed handshakes are logged and
/// skipped.
struct AxumListener<S> {
    stream: S,
    local_addr: SocketAddr,
}

impl<S, I, E> Listener for AxumListener<S>
where
    S: futures_util::Stream<Item = Result<(I, SocketAddr), E>> + Unpin + Send + 'static,
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    type Io = I;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        loop {
            match self.stream.next().await {
                Some(Ok((io, addr))) => return (io, addr),
                Some(Err(e)) => tracing::debug!("TLS accept error: {}", e),
                None => std::future::pending().await,
            }
        }
    }

    fn local_addr(&self) -> std::io::Result<Self::Addr> {
        Ok(self.local_addr)
    }
}

/// Both the certificate and the key file exist.
pub fn tls_files_present(tls: &TlsConfig) -> bool {
    tls.cert_path.is_file() && tls.key_path.is_file()
}

/// Build a rustls server config from PEM files (any key type rustls-pemfile reads).
pub fn load_rustls_config(cert_path: &Path, key_path: &Path) -> Result<rustls::ServerConfig> {
    let cert_file = &mut BufReader::new(
        File::open(cert_path)
            .wrap_err_with(|| format!("failed to open cert file {}", cert_path.display()))?,
    );
    let key_file = &mut BufReader::new(
        File::open(key_path)
            .wrap_err_with(|| format!("failed to open key file {}", key_path.display()))?,
    );

    let cert_chain = certs(cert_file)
        .collect::<Result<Vec<_>, _>>()
        .wrap_err("failed to parse certificates")?;
    if cert_chain.is_empty() {
        return Err(eyre!("No certificate found in {}", cert_path.display()));
    }
    let key = private_key(key_file)
        .wrap_err("failed to parse private key")?
        .ok_or_else(|| eyre!("No private key found in {}", key_path.display()))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .wrap_err("unsupported TLS protocol versions")?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)
        .wrap_err("invalid certificate or key")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

/// Serve `router` over TLS on `addr` until `shutdown` fires.
pub async fn serve_tls(
    addr: String,
    tls: TlsConfig,
    router: Router,
    shutdown: ShutdownToken,
) -> Result<()> {
    let config = load_rustls_config(&tls.cert_path, &tls.key_path)?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind TLS listener to {addr}"))?;
    let local_addr = listener
        .local_addr()
        .wrap_err("Failed to get local addr")?;

    let acceptor = tokio_rustls::TlsAcceptor::from(Arc::new(config));
    let listener = AxumListener {
        stream: TlsListener::new(acceptor, listener),
        local_addr,
    };

    tracing::info!("Serving TLS on {}", local_addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.wait_for_shutdown().await;
        })
        .await
        .wrap_err("TLS server error")
}
