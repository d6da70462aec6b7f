//! Authenticated session state.
//!
//! A [`Session`] is either anonymous or carries a bearer token together with
//! the identity it was issued for. The two are stored as one value, so a
//! token without an identity (or the reverse) cannot be represented.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{ConsoleError, ConsoleResult};

/// An opaque bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>` header value.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BearerToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Authenticated {
    token: BearerToken,
    identity: String,
}

/// Credential and identity of the signed-in user, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    auth: Option<Authenticated>,
}

impl Session {
    /// A session with no credential.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session for `identity` holding `token`.
    pub fn authenticated(token: BearerToken, identity: impl Into<String>) -> Self {
        Self {
            auth: Some(Authenticated {
                token,
                identity: identity.into(),
            }),
        }
    }

    /// True if a credential is present.
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// The bearer token, if signed in.
    pub fn credential(&self) -> Option<&BearerToken> {
        self.auth.as_ref().map(|a| &a.token)
    }

    /// The username the token was issued for, if signed in.
    pub fn identity(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.identity.as_str())
    }

    /// The bearer token, or `Unauthenticated`.
    pub fn require_credential(&self) -> ConsoleResult<&BearerToken> {
        self.credential().ok_or(ConsoleError::Unauthenticated)
    }
}

/// The one session of an application context, shared between the console
/// and the view refreshers.
///
/// Only the login/logout flow writes to it; everything else takes a
/// [`snapshot`](SharedSession::snapshot).
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<Session>>,
}

impl SharedSession {
    /// Create an anonymous shared session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the current session.
    pub fn replace(&self, session: Session) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }

    /// Drop the credential.
    pub fn clear(&self) {
        self.replace(Session::anonymous());
    }

    /// True if a credential is present.
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_session() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert!(session.credential().is_none());
        assert!(session.identity().is_none());
        assert!(matches!(
            session.require_credential(),
            Err(ConsoleError::Unauthenticated)
        ));
    }

    #[test]
    fn test_authenticated_session_pairs_token_and_identity() {
        let session = Session::authenticated(BearerToken::new("tok"), "alice");
        assert!(session.is_authenticated());
        assert_eq!(session.identity(), Some("alice"));
        assert_eq!(session.require_credential().unwrap().expose(), "tok");
        assert_eq!(
            session.credential().unwrap().header_value(),
            "Bearer tok"
        );
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let session = Session::authenticated(BearerToken::new("super-secret"), "alice");
        let debug = format!("{:?}", session);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_shared_session_replace_and_clear() {
        let shared = SharedSession::new();
        let other = shared.clone();
        assert!(!shared.is_authenticated());

        shared.replace(Session::authenticated(BearerToken::new("t"), "bob"));
        assert_eq!(other.snapshot().identity(), Some("bob"));

        other.clear();
        assert!(!shared.is_authenticated());
    }
}
