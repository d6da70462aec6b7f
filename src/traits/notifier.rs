//! User notification trait abstraction.

use crate::notifications::Notice;

/// Surfaces [`Notice`]s to the user (toast, banner, log line).
///
/// Called from the real-time driver task, so implementations must not block.
pub trait Notifier: Send + Sync {
    /// Show a notice.
    fn notify(&self, notice: Notice);
}
