use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Scriptable stand-in for the session backend.
///
/// Routes are scripted with exact responses and every received request is
/// recorded, so tests can assert on both what the client sent and how it
/// interpreted the answer.
#[derive(Default)]
pub struct MockBackend {
    responses: HashMap<String, MockResponse>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for a route, e.g. `"GET /api/v1/user"`.
    pub fn on(mut self, route: &str, response: MockResponse) -> Self {
        self.responses.insert(route.to_string(), response);
        self
    }

    pub async fn spawn(self) -> RunningBackend {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let state = BackendState {
            responses: Arc::new(self.responses),
            received: Arc::new(Mutex::new(Vec::new())),
        };

        let received = state.received.clone();
        let app = Router::new().fallback(handle).with_state(state);

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
                .unwrap();
        });

        RunningBackend {
            address,
            received,
            _shutdown: shutdown.drop_guard(),
        }
    }
}

pub struct RunningBackend {
    address: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
    _shutdown: DropGuard,
}

impl RunningBackend {
    pub fn origin(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

/// An origin nothing listens on, for connection-refused scenarios.
pub async fn unreachable_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    format!("http://{address}")
}

#[derive(Clone)]
struct BackendState {
    responses: Arc<HashMap<String, MockResponse>>,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

#[derive(Clone)]
pub struct MockResponse {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: Vec<u8>,
}

impl MockResponse {
    pub fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json"),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    /// A body that claims to be JSON but does not parse.
    pub fn malformed_json(status: StatusCode) -> Self {
        Self {
            status,
            content_type: Some("application/json"),
            body: b"{not json".to_vec(),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8"),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let mut builder = Response::builder().status(self.status);

        if let Some(content_type) = self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }

        builder.body(self.body.into()).unwrap()
    }
}

/// One request as the mock saw it on the wire.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path: String,
    headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

async fn handle(State(state): State<BackendState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let key = format!("{method} {}", uri.path());

    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();

    state.received.lock().unwrap().push(ReceivedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers,
        body: serde_json::from_slice(&body).ok(),
    });

    match state.responses.get(&key) {
        Some(response) => response.clone().into_response(),
        None => MockResponse::text(StatusCode::NOT_FOUND, "no scripted response").into_response(),
    }
}
