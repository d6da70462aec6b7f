//! Error category classification.
//!
//! Categories drive the handling decision for a failure: whether it may be
//! retried, whether the user must sign in again, or whether it should just be
//! reported.

use std::fmt;

/// High-level categorization of console errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection refused, DNS, timeouts, dropped sockets.
    /// Generally transient and retryable.
    Network,

    /// Missing or rejected credentials. Requires signing in again.
    Auth,

    /// Backend errors (HTTP 5xx). Retryable after a delay.
    Server,

    /// The backend refused a request we built (4xx other than 401), or sent
    /// something we could not decode.
    Client,

    /// Terminal conditions the user has to act on, such as the real-time
    /// channel giving up.
    User,

    /// Invalid configuration values.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label suitable for structured logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Suggested recovery action shown next to user-facing messages.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check that the AlphaBase server is reachable and try again",
            ErrorCategory::Auth => "Sign in again",
            ErrorCategory::Server => "The server is having trouble. Try again in a moment",
            ErrorCategory::Client => "Check the collection, key and value you entered",
            ErrorCategory::User => "Reconnect to resume live updates",
            ErrorCategory::Configuration => "Check the ALPHABASE_* environment variables",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
