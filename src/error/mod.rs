//! Error handling for the console.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Unified Error Type**: `ConsoleError` for every public operation
//! - **Result Type Alias**: `ConsoleResult<T>`
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection refused, timeout | Yes |
//! | Auth | Missing or rejected credential | No |
//! | Server | Backend errors (5xx) | Yes |
//! | Client | Rejected request, undecodable body | No |
//! | User | Real-time reconnect budget exhausted | No |
//! | Configuration | Invalid settings | No |

mod category;
mod console_error;

pub use category::ErrorCategory;
pub use console_error::ConsoleError;

/// Result alias used across the crate.
pub type ConsoleResult<T> = Result<T, ConsoleError>;
