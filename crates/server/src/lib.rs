mod error;
mod session;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use config::Config;
use session_api::{ApiClient, RequestCredentials};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use error::Error;
pub use session::{SessionLayer, SessionService};

pub(crate) type Result<T> = std::result::Result<T, error::Error>;

pub struct ServeConfig {
    pub listen_address: SocketAddr,
    pub config: Config,
    /// Downstream page router; rendering itself lives outside this crate.
    pub pages: Router,
    pub shutdown_signal: CancellationToken,
}

/// Runs the page pipeline: session enrichment wrapped around the given page
/// router, served over plain HTTP or TLS depending on configuration.
pub async fn serve(
    ServeConfig {
        listen_address,
        config,
        pages,
        shutdown_signal,
    }: ServeConfig,
) -> crate::Result<()> {
    let api = ApiClient::new(config.api.url.as_str(), Arc::new(RequestCredentials::empty())).map_err(Error::Client)?;

    let app = pages.layer(SessionLayer::new(api));

    let listener = TcpListener::bind(listen_address).await.map_err(Error::Bind)?;

    match &config.server.tls {
        Some(tls_config) => {
            let rustls_config = RustlsConfig::from_pem_file(&tls_config.certificate, &tls_config.key)
                .await
                .map_err(|e| Error::Tls(e.to_string()))?;

            log::info!("Pages available at: https://{listen_address}");

            // Convert tokio listener to std listener for axum-server
            let std_listener = listener.into_std().map_err(Error::Bind)?;

            let handle = axum_server::Handle::new();

            {
                let handle = handle.clone();
                let shutdown_signal = shutdown_signal.clone();

                tokio::spawn(async move {
                    shutdown_signal.cancelled().await;
                    handle.graceful_shutdown(Some(Duration::from_secs(5)));
                });
            }

            axum_server::from_tcp_rustls(std_listener, rustls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .map_err(|e| Error::Server(std::io::Error::other(e)))?;
        }
        None => {
            log::info!("Pages available at: http://{listen_address}");

            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown_signal.cancelled().await })
                .await
                .map_err(Error::Server)?;
        }
    }

    Ok(())
}
