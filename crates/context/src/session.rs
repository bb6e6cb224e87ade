use serde::Serialize;

use crate::Identity;

/// Per-request session fields consumed by page rendering.
///
/// Inserted into the request extensions by the enrichment layer before the
/// downstream router runs. The four fields are a stable contract: they are
/// always populated together, so an unauthenticated context never carries
/// leftover user fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub is_authenticated: bool,
    pub user_name: String,
    pub user_email: String,
    pub user_validated: bool,
}

impl SessionContext {
    /// The shape every request gets when no identity could be resolved,
    /// whether because there is no session or because the lookup failed.
    /// All four fields flip together; nothing is carried over.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl From<Identity> for SessionContext {
    fn from(identity: Identity) -> Self {
        Self {
            is_authenticated: true,
            user_name: identity.name,
            user_email: identity.email,
            user_validated: identity.validated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_context_has_empty_user_fields() {
        let context = SessionContext::anonymous();

        assert!(!context.is_authenticated);
        assert!(context.user_name.is_empty());
        assert!(context.user_email.is_empty());
        assert!(!context.user_validated);
    }

    #[test]
    fn identity_maps_onto_authenticated_context() {
        let identity = Identity {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            validated: true,
        };

        let context = SessionContext::from(identity);

        assert_eq!(
            context,
            SessionContext {
                is_authenticated: true,
                user_name: "Ada".to_string(),
                user_email: "ada@example.com".to_string(),
                user_validated: true,
            }
        );
    }
}
