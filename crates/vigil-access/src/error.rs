//! Access evaluation errors.

use thiserror::Error;
use vigil_auth::AuthError;
use vigil_core::ParseCapabilityError;
use vigil_policy::PolicyError;

/// Errors raised by [`crate::AccessEvaluator`].
///
/// A deny decision is not an error; these are requests that never reached
/// a decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The credential did not authenticate.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The requested operation is not one of the known operations.
    #[error(transparent)]
    InvalidOperation(#[from] ParseCapabilityError),

    /// The request path is malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why.
        reason: &'static str,
    },

    /// The policy store failed.
    #[error("policy store error: {0}")]
    Policy(#[from] PolicyError),
}

impl AccessError {
    /// Whether the caller failed to authenticate.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Message safe to return to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Auth(e) => e.public_message().to_string(),
            Self::Policy(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for access evaluation.
pub type AccessResult<T> = Result<T, AccessError>;
