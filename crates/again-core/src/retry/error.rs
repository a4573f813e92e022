//! Error types for policy validation and the one-shot retry helper.

use thiserror::Error;

/// Policy rejected before any attempt was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Exponential backoff with a base of 0 or 1 never grows.
    #[error("exponential backoff needs a multiplier of at least 2, got {multiplier}")]
    MultiplierTooSmall { multiplier: u32 },
}

/// Unknown backoff mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown backoff mode '{0}' (expected fixed, linear or exponential)")]
pub struct ParseModeError(pub String);

/// Error from [`run_with_retry`](super::run_with_retry).
///
/// `Failed` displays as the wrapped error so the root cause is never hidden.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Failed(E),
}

impl<E> RetryError<E> {
    /// The unit of work's own error, if that is what ended the loop.
    pub fn into_failure(self) -> Option<E> {
        match self {
            RetryError::Failed(e) => Some(e),
            RetryError::Config(_) => None,
        }
    }
}
