//! Identity binding: credential in, [`Identity`] out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use vigil_core::{Timestamp, TokenId};
use vigil_crypto::{KeyId, TrustAnchor};

use crate::binding::{BindingRegistry, CertBinding};
use crate::certificate::{CertificateId, ClientCertificate};
use crate::error::{AuthError, AuthResult};
use crate::revocation::{NoRevocation, RevocationChecker, RevocationStatus};
use crate::token::{Identity, TokenGrant, TokenStore};

/// Default bound on a revocation check.
pub const DEFAULT_REVOCATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Something a caller presents to prove who it is.
#[derive(Debug, Clone)]
pub enum Credential {
    /// A CA-signed client certificate.
    Certificate(ClientCertificate),
    /// A token minted by an earlier certificate bind.
    Token(TokenId),
}

impl Credential {
    /// Short description for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Certificate(_) => "certificate",
            Self::Token(_) => "token",
        }
    }
}

impl From<ClientCertificate> for Credential {
    fn from(cert: ClientCertificate) -> Self {
        Self::Certificate(cert)
    }
}

impl From<TokenId> for Credential {
    fn from(token: TokenId) -> Self {
        Self::Token(token)
    }
}

/// Binder settings.
#[derive(Debug, Clone)]
pub struct BinderConfig {
    /// Trusted CA keys.
    pub trust_anchor: TrustAnchor,
    /// Tolerance applied to both ends of a certificate's validity window.
    pub clock_skew: Duration,
    /// Bound on each revocation check.
    pub revocation_timeout: Duration,
}

impl BinderConfig {
    /// Settings trusting `trust_anchor`, with no skew and the default
    /// revocation timeout.
    #[must_use]
    pub fn new(trust_anchor: TrustAnchor) -> Self {
        Self {
            trust_anchor,
            clock_skew: Duration::ZERO,
            revocation_timeout: DEFAULT_REVOCATION_TIMEOUT,
        }
    }

    /// Set the clock skew tolerance.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Set the revocation timeout.
    #[must_use]
    pub fn with_revocation_timeout(mut self, timeout: Duration) -> Self {
        self.revocation_timeout = timeout;
        self
    }
}

/// Turns credentials into identities.
pub struct IdentityBinder {
    config: BinderConfig,
    bindings: BindingRegistry,
    tokens: TokenStore,
    revocation: Arc<dyn RevocationChecker>,
}

impl IdentityBinder {
    /// Create a binder with no bindings and no revocation source.
    #[must_use]
    pub fn new(config: BinderConfig) -> Self {
        Self {
            config,
            bindings: BindingRegistry::new(),
            tokens: TokenStore::new(),
            revocation: Arc::new(NoRevocation),
        }
    }

    /// Use `checker` for revocation checks.
    #[must_use]
    pub fn with_revocation_checker(mut self, checker: Arc<dyn RevocationChecker>) -> Self {
        self.revocation = checker;
        self
    }

    /// Binder settings.
    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Live tokens.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Log in: authenticate a credential and, for a certificate, mint a
    /// token the caller can present on later requests.
    ///
    /// Presenting a token returns its identity without minting another.
    ///
    /// # Errors
    ///
    /// Any [`AuthError`]; every failure should be answered with
    /// [`AuthError::public_message`].
    pub async fn bind(&self, credential: &Credential) -> AuthResult<Identity> {
        let result = match credential {
            Credential::Certificate(cert) => self
                .map_certificate(cert)
                .await
                .and_then(|grant| self.tokens.issue(grant)),
            Credential::Token(token) => self.tokens.get(token),
        };
        log_outcome(credential, &result);
        result
    }

    /// Authenticate a credential without minting a token.
    ///
    /// A certificate yields an identity whose [`Identity::token`] is `None`;
    /// the token store is left untouched. This is the per-request path.
    ///
    /// # Errors
    ///
    /// As [`Self::bind`].
    pub async fn authenticate(&self, credential: &Credential) -> AuthResult<Identity> {
        let result = match credential {
            Credential::Certificate(cert) => self
                .map_certificate(cert)
                .await
                .map(|grant| grant.into_identity(None)),
            Credential::Token(token) => self.tokens.get(token),
        };
        log_outcome(credential, &result);
        result
    }

    async fn map_certificate(&self, cert: &ClientCertificate) -> AuthResult<TokenGrant> {
        cert.verify(&self.config.trust_anchor)?;
        cert.check_validity(Timestamp::now(), self.config.clock_skew)?;
        self.check_revocation(cert).await?;

        let fingerprint = cert.fingerprint();
        let (source, binding) = self
            .bindings
            .lookup(&fingerprint, cert.issuer())?
            .ok_or_else(|| AuthError::NoBinding {
                fingerprint: fingerprint.to_hex(),
            })?;

        if !binding.allows_common_name(cert.common_name()) {
            return Err(AuthError::CommonNameNotAllowed {
                common_name: cert.common_name().to_string(),
            });
        }

        Ok(TokenGrant {
            subject: cert.common_name().to_string(),
            certificate: fingerprint,
            binding: binding.name().to_string(),
            source,
            policies: binding.policies().to_vec(),
            period: binding.token_period(),
        })
    }

    async fn check_revocation(&self, cert: &ClientCertificate) -> AuthResult<()> {
        let check = self.revocation.check(cert);
        match tokio::time::timeout(self.config.revocation_timeout, check).await {
            Err(_) => Err(AuthError::RevocationTimeout),
            Ok(Err(e)) => Err(AuthError::RevocationCheckFailed(e.to_string())),
            Ok(Ok(RevocationStatus::Revoked)) => Err(AuthError::CertificateRevoked {
                serial: cert.serial(),
            }),
            Ok(Ok(RevocationStatus::Good)) => Ok(()),
        }
    }

    /// Renew a token.
    ///
    /// # Errors
    ///
    /// [`AuthError::UnknownToken`] or [`AuthError::TokenExpired`].
    pub fn renew(&self, token: &TokenId) -> AuthResult<Identity> {
        self.tokens.renew(token)
    }

    /// Revoke a token. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn revoke_token(&self, token: &TokenId) -> AuthResult<bool> {
        self.tokens.revoke(token)
    }

    /// Bind a single certificate.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn bind_certificate(&self, id: CertificateId, binding: CertBinding) -> AuthResult<()> {
        self.bindings.bind_certificate(id, binding)
    }

    /// Bind every certificate from `issuer`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn bind_issuer(&self, issuer: KeyId, binding: CertBinding) -> AuthResult<()> {
        self.bindings.bind_issuer(issuer, binding)
    }

    /// Remove a certificate binding.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn unbind_certificate(&self, id: &CertificateId) -> AuthResult<bool> {
        self.bindings.unbind_certificate(id)
    }

    /// Remove an issuer binding.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn unbind_issuer(&self, issuer: &KeyId) -> AuthResult<bool> {
        self.bindings.unbind_issuer(issuer)
    }
}

fn log_outcome(credential: &Credential, result: &AuthResult<Identity>) {

    match result {
        Ok(identity) => debug!(
            credential = credential.kind(),
            subject = %identity.subject(),
            policies = ?identity.policies(),
            minted = identity.token().is_some(),
            "Credential bound"
        ),
        Err(e) => warn!(credential = credential.kind(), error = %e, "Authentication failed"),
    }
}

impl std::fmt::Debug for IdentityBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityBinder")
            .field("config", &self.config)
            .field("bindings", &self.bindings)
            .field("tokens", &self.tokens.len().ok())
            .finish_non_exhaustive()
    }
}
