use http::StatusCode;
use indexmap::IndexMap;
use serde::Deserialize;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Message used when a non-success body carries no usable `error` field.
const FALLBACK_MESSAGE: &str = "An error occurred";

/// Failures an API call can produce.
///
/// Expected HTTP-level failures travel through `Api`; the other variants mean
/// the exchange itself broke before a usable backend answer existed.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend answered with a non-success status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never produced an HTTP response.
    #[error("Connection error: {0}")]
    Connection(#[source] reqwest::Error),

    /// A success response carried a body the expected type does not accept.
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Client-side construction failure, e.g. a token that is not a valid
    /// header value. Never caused by backend behavior.
    #[error("Internal client error: {0}")]
    Internal(String),
}

/// Normalized backend error: the real HTTP status, a human-readable message,
/// and the per-field validation messages when the backend reported any.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub field_errors: Option<IndexMap<String, String>>,
}

impl ApiError {
    /// Error for a non-JSON response, built from the status line alone.
    pub(crate) fn from_status(status: StatusCode) -> Self {
        Self {
            status,
            message: format!(
                "HTTP error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            ),
            field_errors: None,
        }
    }

    /// Error for a JSON response body using the backend's `{"error": ...}`
    /// envelope. The `error` field is either a plain message or a map of
    /// field name to message; map values are joined in mapping order so the
    /// result still reads as one sentence.
    pub(crate) fn from_json_body(status: StatusCode, body: serde_json::Value) -> Self {
        match serde_json::from_value::<ErrorResponse>(body) {
            Ok(ErrorResponse {
                error: Some(ErrorDetail::Message(message)),
            }) => Self {
                status,
                message,
                field_errors: None,
            },
            Ok(ErrorResponse {
                error: Some(ErrorDetail::Fields(fields)),
            }) => Self {
                status,
                message: fields.values().cloned().collect::<Vec<_>>().join(", "),
                field_errors: Some(fields),
            },
            Ok(ErrorResponse { error: None }) | Err(_) => Self {
                status,
                message: FALLBACK_MESSAGE.to_string(),
                field_errors: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Fields(IndexMap<String, String>),
}
