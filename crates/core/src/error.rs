//! Control-plane error model.

use thiserror::Error;

/// Result type used across the control plane.
pub type ControlResult<T> = Result<T, ControlError>;

/// Error taxonomy for operations against the remote job store.
///
/// Keep this small and decision-relevant: every store-facing operation
/// surfaces exactly one of success, `InvalidState` or `Unavailable`;
/// `Validation` rejects malformed local input before a remote call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The command is not applicable to the current job/task status.
    /// Carries the store's message verbatim.
    #[error("operation not applicable: {0}")]
    InvalidState(String),

    /// Network or store failure. Retried only via the next scheduled poll
    /// or an explicit user action, never inline.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Malformed local input (e.g. empty annotation text).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl ControlError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// True for failures that leave the last-known-good snapshot in place
    /// without user-visible impact during a silent refresh.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
