//! Authentication error types.

use thiserror::Error;

/// Errors raised while turning a credential into an identity.
///
/// Variants carry enough detail for logs. Callers answering a client should
/// use [`AuthError::public_message`], which never reveals which check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The certificate issuer is not in the trust anchor.
    #[error("certificate issuer {issuer} is not trusted")]
    UntrustedIssuer {
        /// Issuer key id (hex).
        issuer: String,
    },

    /// The certificate signature does not verify.
    #[error("certificate signature is invalid")]
    InvalidSignature,

    /// The certificate's validity window has not started.
    #[error("certificate is not valid until {not_before}")]
    CertificateNotYetValid {
        /// Start of validity.
        not_before: String,
    },

    /// The certificate's validity window has ended.
    #[error("certificate expired at {not_after}")]
    CertificateExpired {
        /// End of validity.
        not_after: String,
    },

    /// The certificate serial is revoked.
    #[error("certificate serial {serial} is revoked")]
    CertificateRevoked {
        /// Revoked serial.
        serial: u64,
    },

    /// The revocation checker reported an error.
    #[error("revocation check failed: {0}")]
    RevocationCheckFailed(String),

    /// The revocation checker did not answer in time.
    #[error("revocation check timed out")]
    RevocationTimeout,

    /// No binding exists for this certificate or its issuer.
    #[error("no binding for certificate {fingerprint}")]
    NoBinding {
        /// Certificate fingerprint (hex).
        fingerprint: String,
    },

    /// The binding does not allow this certificate's common name.
    #[error("common name '{common_name}' is not allowed by the binding")]
    CommonNameNotAllowed {
        /// Rejected common name.
        common_name: String,
    },

    /// The token is not known (never issued, revoked, or evicted).
    #[error("unknown token")]
    UnknownToken,

    /// The token outlived its period without renewal.
    #[error("token expired")]
    TokenExpired,

    /// Credential text could not be decoded.
    #[error("invalid credential encoding: {0}")]
    InvalidEncoding(String),

    /// A binding definition is malformed.
    #[error("invalid binding: {0}")]
    InvalidBinding(String),

    /// Internal failure (lock poisoning).
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Message safe to return to an unauthenticated client.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        "permission denied"
    }
}

/// Result type for authentication.
pub type AuthResult<T> = Result<T, AuthError>;
