//! Access tokens and the identities they carry.
//!
//! A successful certificate bind mints a token. Later requests may present
//! the token instead of the certificate. A token with a zero period never
//! expires; otherwise it expires once more than `period` has elapsed since it
//! was issued or last renewed. Expiry is measured on the Tokio clock so tests
//! can pause and advance time.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;
use vigil_core::{Timestamp, TokenId};

use crate::binding::BindingSource;
use crate::certificate::CertificateId;
use crate::error::{AuthError, AuthResult};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    subject: String,
    certificate: CertificateId,
    binding: String,
    source: BindingSource,
    policies: Arc<[String]>,
    token: Option<TokenId>,
    token_period: Duration,
    issued_at: Timestamp,
}

impl Identity {
    /// Certificate common name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Fingerprint of the certificate this identity came from.
    #[must_use]
    pub fn certificate(&self) -> &CertificateId {
        &self.certificate
    }

    /// Name of the binding that granted the policies.
    #[must_use]
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Whether the binding matched the certificate or its issuer.
    #[must_use]
    pub fn binding_source(&self) -> BindingSource {
        self.source
    }

    /// Bound policy names. Empty means every request is denied.
    #[must_use]
    pub fn policies(&self) -> &[String] {
        &self.policies
    }

    /// Token minted for this identity. `None` when the credential was only
    /// authenticated, not logged in.
    #[must_use]
    pub fn token(&self) -> Option<&TokenId> {
        self.token.as_ref()
    }

    /// Token period (zero = non-expiring).
    #[must_use]
    pub fn token_period(&self) -> Duration {
        self.token_period
    }

    /// Wall-clock issue time, for audit.
    #[must_use]
    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }
}

/// Fields needed to mint a token.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// Certificate common name.
    pub subject: String,
    /// Certificate fingerprint.
    pub certificate: CertificateId,
    /// Binding name.
    pub binding: String,
    /// Where the binding was found.
    pub source: BindingSource,
    /// Granted policies.
    pub policies: Vec<String>,
    /// Token period.
    pub period: Duration,
}

impl TokenGrant {
    /// The identity this grant describes, carrying `token` if one was minted.
    #[must_use]
    pub fn into_identity(self, token: Option<TokenId>) -> Identity {
        Identity {
            subject: self.subject,
            certificate: self.certificate,
            binding: self.binding,
            source: self.source,
            policies: self.policies.into(),
            token,
            token_period: self.period,
            issued_at: Timestamp::now(),
        }
    }
}

/// A stored token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    identity: Identity,
    renewed_at: Instant,
}

impl AccessToken {
    /// The identity this token stands for.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        let period = self.identity.token_period;
        !period.is_zero() && now.saturating_duration_since(self.renewed_at) > period
    }

    /// Time left before expiry, `None` for non-expiring tokens.
    #[must_use]
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        let period = self.identity.token_period;
        if period.is_zero() {
            return None;
        }
        Some(period.saturating_sub(now.saturating_duration_since(self.renewed_at)))
    }
}

/// Live tokens.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<TokenId, AccessToken>>,
}

impl TokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint and store a token for `grant`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn issue(&self, grant: TokenGrant) -> AuthResult<Identity> {
        let id = TokenId::new();
        let identity = grant.into_identity(Some(id.clone()));

        let token = AccessToken {
            identity: identity.clone(),
            renewed_at: Instant::now(),
        };
        self.tokens
            .write()
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .insert(id, token);

        Ok(identity)
    }

    /// Look up a live token. An expired token is evicted.
    ///
    /// # Errors
    ///
    /// [`AuthError::UnknownToken`] or [`AuthError::TokenExpired`].
    pub fn get(&self, id: &TokenId) -> AuthResult<Identity> {
        let now = Instant::now();
        {
            let tokens = self
                .tokens
                .read()
                .map_err(|e| AuthError::Internal(e.to_string()))?;
            let token = tokens.get(id).ok_or(AuthError::UnknownToken)?;
            if !token.is_expired_at(now) {
                return Ok(token.identity.clone());
            }
        }

        self.evict(id)?;
        Err(AuthError::TokenExpired)
    }

    /// Reset a token's period. A zero-period token is left untouched.
    ///
    /// # Errors
    ///
    /// [`AuthError::UnknownToken`] or [`AuthError::TokenExpired`].
    pub fn renew(&self, id: &TokenId) -> AuthResult<Identity> {
        let now = Instant::now();
        let mut tokens = self
            .tokens
            .write()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let token = tokens.get_mut(id).ok_or(AuthError::UnknownToken)?;

        if token.is_expired_at(now) {
            tokens.remove(id);
            return Err(AuthError::TokenExpired);
        }
        if !token.identity.token_period.is_zero() {
            token.renewed_at = now;
            debug!(token = %id, "Token renewed");
        }
        Ok(token.identity.clone())
    }

    /// Remove a token. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn revoke(&self, id: &TokenId) -> AuthResult<bool> {
        self.evict(id)
    }

    /// Drop every expired token. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn purge_expired(&self) -> AuthResult<usize> {
        let now = Instant::now();
        let mut tokens = self
            .tokens
            .write()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired_at(now));
        Ok(before.saturating_sub(tokens.len()))
    }

    /// Number of stored tokens, expired ones included until evicted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn len(&self) -> AuthResult<usize> {
        Ok(self
            .tokens
            .read()
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .len())
    }

    /// Whether the store is empty.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn is_empty(&self) -> AuthResult<bool> {
        Ok(self.len()? == 0)
    }

    fn evict(&self, id: &TokenId) -> AuthResult<bool> {
        Ok(self
            .tokens
            .write()
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .remove(id)
            .is_some())
    }
}
