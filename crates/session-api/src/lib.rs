mod credentials;
mod error;
mod http_client;

use std::sync::Arc;

use context::Identity;
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use secrecy::ExposeSecret;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

pub use credentials::{CROSS_ORIGIN_TOKEN_COOKIE, CredentialSource, RequestCredentials};
pub use error::{ApiError, ClientError, ClientResult};

/// Fixed prefix every backend endpoint lives under.
const API_BASE_PATH: &str = "/api/v1";

/// Header the anti-forgery token is echoed under on state-changing requests,
/// spelled `X-Cross-Origin-Token` on the wire.
const CROSS_ORIGIN_TOKEN_HEADER: &str = "x-cross-origin-token";

/// Acknowledgment returned by `logout`. The backend may answer with an empty
/// body, in which case the message defaults to empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutAck {
    #[serde(default)]
    pub message: String,
}

/// Typed client for the session backend.
///
/// One client is built per process and owns the connection pool; [`scoped`]
/// binds a cheap copy to a single request's credentials. Operations report
/// expected backend failures as [`ApiError`] values instead of panicking, so
/// callers match on outcomes exhaustively.
///
/// [`scoped`]: ApiClient::scoped
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl ApiClient {
    /// Creates a client against the given backend origin, e.g.
    /// `http://127.0.0.1:4000`. The `/api/v1` prefix is appended internally.
    pub fn new(origin: &str, credentials: Arc<dyn CredentialSource>) -> ClientResult<Self> {
        let http = http_client::default_http_client_builder()
            .build()
            .map_err(|e| ClientError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: format!("{}{API_BASE_PATH}", origin.trim_end_matches('/')),
            credentials,
        })
    }

    /// A copy of this client bound to different credentials, sharing the
    /// connection pool. Used once per inbound request.
    pub fn scoped(&self, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            credentials,
        }
    }

    /// Logs in with an email and password, establishing a backend session.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Identity> {
        let body = json!({ "email": email, "password": password });

        self.request(Method::POST, "/login", Some(&body), HeaderMap::new()).await
    }

    /// Ends the current backend session.
    pub async fn logout(&self) -> ClientResult<LogoutAck> {
        self.request(Method::POST, "/logout", None, HeaderMap::new()).await
    }

    /// Registers a new user. Validation failures come back as an [`ApiError`]
    /// with per-field messages.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> ClientResult<Identity> {
        let body = json!({ "name": name, "email": email, "password": password });

        self.request(Method::POST, "/users", Some(&body), HeaderMap::new()).await
    }

    /// Resolves the identity behind the ambient session cookies.
    ///
    /// A 401 means "no session" and is a normal outcome, returned as `None`.
    /// Every other failure propagates so callers can tell a missing session
    /// apart from a broken lookup.
    pub async fn current_identity(&self) -> ClientResult<Option<Identity>> {
        match self.request(Method::GET, "/user", None, HeaderMap::new()).await {
            Ok(identity) => Ok(Some(identity)),
            Err(ClientError::Api(error)) if error.status == StatusCode::UNAUTHORIZED => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Low-level request primitive shared by every operation.
    ///
    /// Sets the JSON content type, merges `extra_headers` on top so callers
    /// can extend or override the defaults, and attaches the cross-origin
    /// token for state-changing methods when the credential source has one.
    /// GET requests never carry the token.
    pub async fn request<T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
        extra_headers: HeaderMap,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{endpoint}", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(extra_headers);

        if is_state_changing(&method)
            && let Some(token) = self.credentials.cross_origin_token()
        {
            let value = HeaderValue::from_str(token.expose_secret())
                .map_err(|_| ClientError::Internal("cross-origin token is not a valid header value".to_string()))?;

            headers.insert(CROSS_ORIGIN_TOKEN_HEADER, value);
        }

        if let Some(cookies) = self.credentials.cookie_header() {
            match HeaderValue::from_str(&cookies) {
                Ok(value) => {
                    headers.insert(header::COOKIE, value);
                }
                Err(_) => log::debug!("Dropping malformed Cookie header on request to {endpoint}"),
            }
        }

        let mut request = self.http.request(method, url).headers(headers);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ClientError::Connection)?;

        decode_response(response).await
    }
}

fn is_state_changing(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::DELETE].contains(method)
}

/// Turns a raw backend response into a typed result.
///
/// Non-JSON bodies: a failure status becomes an error built from the status
/// line, a success status decodes as the empty object so endpoints with empty
/// bodies still produce a value. JSON bodies: success statuses decode into
/// `T`, failure statuses go through the backend's error envelope.
async fn decode_response<T>(response: reqwest::Response) -> ClientResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));

    if !is_json {
        if !status.is_success() {
            return Err(ApiError::from_status(status).into());
        }

        return serde_json::from_value(serde_json::Value::Object(serde_json::Map::new())).map_err(ClientError::Decode);
    }

    let text = response.text().await.map_err(ClientError::Connection)?;

    let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        log::debug!("Response claimed application/json but did not parse ({} bytes)", text.len());
        ClientError::Decode(e)
    })?;

    if !status.is_success() {
        return Err(ApiError::from_json_body(status, body).into());
    }

    serde_json::from_value(body).map_err(ClientError::Decode)
}
