mod backend;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Extension, Json, Router, routing::get};
use config::Config;
use context::SessionContext;
use server::ServeConfig;
use session_api::{ApiClient, RequestCredentials};
use tokio::net::TcpListener;
use tokio_util::sync::{CancellationToken, DropGuard};

pub use backend::{MockBackend, MockResponse, ReceivedRequest, RunningBackend, unreachable_origin};

/// An API client pointed at the given backend, scoped to the cookies of a
/// hypothetical inbound request (or to none).
pub fn api_client(origin: &str, cookie_header: Option<&str>) -> ApiClient {
    let credentials = match cookie_header {
        Some(header) => RequestCredentials::from_cookie_header(header),
        None => RequestCredentials::empty(),
    };

    ApiClient::new(origin, Arc::new(credentials)).unwrap()
}

/// Test client for making page requests to the portal under test
pub struct TestClient {
    base_url: String,
    client: reqwest::Client,
}

impl TestClient {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_with_cookies(&self, path: &str, cookies: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .header(http::header::COOKIE, cookies)
            .send()
            .await
            .unwrap()
    }

    async fn try_get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(format!("{}{path}", self.base_url)).send().await
    }
}

/// Boots the real page pipeline against the given backend origin, with a
/// probe route that echoes the session context the enrichment layer produced.
pub struct TestServer {
    pub client: TestClient,
    pub address: SocketAddr,
    _shutdown: DropGuard,
    _task_handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn start(backend_origin: &str) -> Self {
        // Write config to a temporary file and use the proper loader to
        // ensure validation runs on the same path as production.
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, format!("[api]\nurl = \"{backend_origin}\"\n")).unwrap();

        let config = Config::load(&config_path).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let shutdown_signal = CancellationToken::new();

        let serve_config = ServeConfig {
            listen_address: address,
            config,
            pages: probe_router(),
            shutdown_signal: shutdown_signal.clone(),
        };

        let task_handle = tokio::spawn(async move {
            // Drop the listener so the server can bind to the address
            drop(listener);

            if let Err(e) = server::serve(serve_config).await {
                log::error!("Test server exited early: {e}");
            }
        });

        let client = TestClient::new(format!("http://{address}"));

        let mut retries = 50;

        while retries > 0 {
            if client.try_get("/probe").await.is_ok() {
                break;
            }

            retries -= 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert!(retries > 0, "Test server failed to become ready");

        TestServer {
            client,
            address,
            _shutdown: shutdown_signal.drop_guard(),
            _task_handle: task_handle,
        }
    }
}

fn probe_router() -> Router {
    Router::new().route("/probe", get(probe))
}

async fn probe(Extension(session): Extension<SessionContext>) -> Json<SessionContext> {
    Json(session)
}
