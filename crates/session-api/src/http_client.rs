use std::time::Duration;

use http::{HeaderMap, HeaderValue, header};
use reqwest::Client;

/// Transport client shared by every request going to the backend.
///
/// Connections are pooled per process; credentials stay out of here entirely
/// and are attached per request, so nothing session-scoped can leak between
/// callers through the pool.
pub(crate) fn default_http_client_builder() -> reqwest::ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

    Client::builder()
        .timeout(Duration::from_secs(60))
        .pool_idle_timeout(Some(Duration::from_secs(5)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .default_headers(headers)
}
