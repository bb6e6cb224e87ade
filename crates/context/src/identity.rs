use serde::Deserialize;

/// The authenticated principal as the backend reports it.
///
/// A fresh value is fetched per inbound request; nothing is cached across
/// requests, so a stale identity can never outlive its session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub validated: bool,
}
