use secrecy::SecretString;

/// The cookie the backend's cross-origin protection issues its token under.
pub const CROSS_ORIGIN_TOKEN_COOKIE: &str = "cross-origin-token";

/// Where a request's ambient credentials come from.
///
/// Injected into the client instead of having it read cookie storage on its
/// own, so the client can be exercised without a real browser or server
/// request behind it.
pub trait CredentialSource: Send + Sync {
    /// The anti-forgery token previously issued by the backend, if any.
    ///
    /// The client only reads the token; issuing and expiring it is entirely
    /// the backend's business.
    fn cross_origin_token(&self) -> Option<SecretString>;

    /// Cookies forwarded verbatim so the backend sees the caller's session.
    fn cookie_header(&self) -> Option<String>;
}

/// Credentials captured from one inbound request's `Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    cookie_header: Option<String>,
}

impl RequestCredentials {
    pub fn from_cookie_header(header: impl Into<String>) -> Self {
        Self {
            cookie_header: Some(header.into()),
        }
    }

    /// A source with no cookies at all, as seen on a first visit.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl CredentialSource for RequestCredentials {
    fn cross_origin_token(&self) -> Option<SecretString> {
        let cookies = self.cookie_header.as_deref()?;

        cookie_value(cookies, CROSS_ORIGIN_TOKEN_COOKIE).map(SecretString::from)
    }

    fn cookie_header(&self) -> Option<String> {
        self.cookie_header.clone()
    }
}

/// Plain `Cookie` header parsing: split on `;`, trim, split on the first `=`
/// and percent-decode the value. A value that does not decode cleanly is
/// returned as-is rather than dropped.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|cookie| {
        let (key, value) = cookie.trim().split_once('=')?;

        (key == name).then(|| match urlencoding::decode(value) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => value.to_string(),
        })
    })
}
