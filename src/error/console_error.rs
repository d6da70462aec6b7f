//! Unified error type for the console.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::traits::HttpError;

/// Every fallible operation of the library returns this error.
///
/// Per-candidate discovery failures and malformed real-time frames never
/// reach callers as `ConsoleError`; they are logged where they happen.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// No credential in the session, or the backend rejected it (HTTP 401).
    #[error("Not authenticated")]
    Unauthenticated,

    /// The login or registration request was refused.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(#[from] HttpError),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered 2xx but the body did not decode.
    #[error("Failed to parse {context} response: {message}")]
    Parse { context: String, message: String },

    /// The real-time channel used its whole reconnect budget.
    #[error("Real-time connection lost after {attempts} reconnect attempts")]
    ConnectionExhausted { attempts: u32 },

    /// A configuration value was present but invalid.
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },
}

impl ConsoleError {
    /// Build a parse error for the named endpoint.
    pub fn parse(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ConsoleError::Parse {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConsoleError::Unauthenticated | ConsoleError::InvalidCredentials(_) => {
                ErrorCategory::Auth
            }
            ConsoleError::Transport(_) => ErrorCategory::Network,
            ConsoleError::Api { status, .. } if *status >= 500 => ErrorCategory::Server,
            ConsoleError::Api { .. } | ConsoleError::Parse { .. } => ErrorCategory::Client,
            ConsoleError::ConnectionExhausted { .. } => ErrorCategory::User,
            ConsoleError::Config { .. } => ErrorCategory::Configuration,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConsoleError::Transport(err) => err.is_retryable(),
            ConsoleError::Api { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            _ => false,
        }
    }

    /// Check if the user has to sign in again.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, ConsoleError::Unauthenticated)
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            ConsoleError::Unauthenticated => {
                "You are not signed in, or your session has expired.".to_string()
            }
            ConsoleError::InvalidCredentials(_) => {
                "Sign in failed. Please check your credentials.".to_string()
            }
            ConsoleError::Transport(_) => {
                "Unable to reach the AlphaBase server.".to_string()
            }
            ConsoleError::Api { status, message } => match *status {
                403 => format!("Access denied: {}", message),
                404 => format!("Not found: {}", message),
                500..=599 => "The server is experiencing issues. Please try again later.".to_string(),
                _ => format!("The server rejected the request: {}", message),
            },
            ConsoleError::Parse { context, .. } => {
                format!("Received an unexpected {} response from the server.", context)
            }
            ConsoleError::ConnectionExhausted { .. } => {
                "Real-time updates disconnected. Reconnect to resume.".to_string()
            }
            ConsoleError::Config { key, message } => format!("{}: {}", key, message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Unauthenticated => "AUTH_MISSING",
            ConsoleError::InvalidCredentials(_) => "AUTH_REJECTED",
            ConsoleError::Transport(_) => "NET_TRANSPORT",
            ConsoleError::Api { .. } => "API_STATUS",
            ConsoleError::Parse { .. } => "API_PARSE",
            ConsoleError::ConnectionExhausted { .. } => "RT_EXHAUSTED",
            ConsoleError::Config { .. } => "CONFIG_INVALID",
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::parse("JSON", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(ConsoleError::Unauthenticated.category(), ErrorCategory::Auth);
        assert_eq!(
            ConsoleError::Transport(HttpError::ConnectionFailed("refused".into())).category(),
            ErrorCategory::Network
        );
        assert_eq!(
            ConsoleError::Api { status: 503, message: "down".into() }.category(),
            ErrorCategory::Server
        );
        assert_eq!(
            ConsoleError::Api { status: 403, message: "no".into() }.category(),
            ErrorCategory::Client
        );
        assert_eq!(
            ConsoleError::ConnectionExhausted { attempts: 5 }.category(),
            ErrorCategory::User
        );
    }

    #[test]
    fn test_retryable() {
        assert!(ConsoleError::Transport(HttpError::Timeout("30s".into())).is_retryable());
        assert!(ConsoleError::Api { status: 502, message: String::new() }.is_retryable());
        assert!(!ConsoleError::Api { status: 404, message: String::new() }.is_retryable());
        assert!(!ConsoleError::Unauthenticated.is_retryable());
        assert!(!ConsoleError::ConnectionExhausted { attempts: 5 }.is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ConsoleError::Api { status: 404, message: "Data not found".into() }.to_string(),
            "API error (404): Data not found"
        );
        assert_eq!(
            ConsoleError::ConnectionExhausted { attempts: 5 }.to_string(),
            "Real-time connection lost after 5 reconnect attempts"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: ConsoleError = json_err.into();
        assert!(matches!(err, ConsoleError::Parse { .. }));
        assert_eq!(err.error_code(), "API_PARSE");
    }

    #[test]
    fn test_reauth_only_for_unauthenticated() {
        assert!(ConsoleError::Unauthenticated.requires_reauth());
        assert!(!ConsoleError::InvalidCredentials("bad".into()).requires_reauth());
    }
}
