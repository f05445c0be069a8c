//! API listener
//!
//! Serves the API router over TLS (rustls, PEM files read once at
//! startup) or plain HTTP when TLS is disabled.

use super::health::ReadinessState;
use super::shutdown::ShutdownSignal;
use crate::config::TlsConfig;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// How long in-flight requests get to finish after shutdown
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Error loading TLS certificate {cert} / key {key}: {source}")]
    Tls {
        cert: PathBuf,
        key: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("API server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serve `app` on `addr` until `shutdown` fires
///
/// `readiness` is set as soon as the socket is bound.
pub async fn run_api_server(
    addr: SocketAddr,
    tls: Option<&TlsConfig>,
    app: Router,
    readiness: ReadinessState,
    mut shutdown: ShutdownSignal,
) -> Result<(), ServerError> {
    let handle = Handle::new();

    let ready_handle = handle.clone();
    tokio::spawn(async move {
        match ready_handle.listening().await {
            Some(bound) => {
                info!(address = %bound, "API server listening");
                readiness.set_ready();
            }
            None => warn!("API server stopped before it was listening"),
        }
    });

    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.wait().await;
        info!("Shutting down API server");
        shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    match tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .map_err(|source| ServerError::Tls {
                    cert: tls.cert_path.clone(),
                    key: tls.key_path.clone(),
                    source,
                })?;
            info!(cert = %tls.cert_path.display(), "TLS enabled");
            axum_server::bind_rustls(addr, rustls)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            warn!("TLS disabled - serving plain HTTP");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    Ok(())
}
