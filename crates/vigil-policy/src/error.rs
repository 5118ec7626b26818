//! Policy error types.

use thiserror::Error;

/// Errors raised by the policy store and resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// No policy is registered under this name.
    #[error("policy not found: {0}")]
    NotFound(String),

    /// The policy name is not acceptable.
    #[error("invalid policy name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A policy document could not be parsed or rendered.
    #[error("invalid policy document: {0}")]
    InvalidDocument(String),

    /// Internal failure (lock poisoning).
    #[error("internal policy store error: {0}")]
    Internal(String),
}

/// Result type for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
