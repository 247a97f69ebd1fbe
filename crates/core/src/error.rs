//! Domain error model for primitive parsing.

use thiserror::Error;

/// Result type used by the primitives in this crate.
pub type DomainResult<T> = Result<T, DomainError>;

/// Failure to build a primitive from untrusted input.
///
/// Business failures (currency, effective window, missing prices) live in
/// `pricing-domain`; this error only covers malformed values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
