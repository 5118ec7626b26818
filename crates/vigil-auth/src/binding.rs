//! Credential bindings: which policies a certificate maps to.
//!
//! A binding is registered either for one certificate (by fingerprint) or
//! for an issuer, in which case it covers every certificate that CA signs.
//! Lookups try the fingerprint first.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::info;
use vigil_crypto::KeyId;

use crate::certificate::CertificateId;
use crate::error::{AuthError, AuthResult};

/// Policies and token settings granted to a bound credential.
#[derive(Clone)]
pub struct CertBinding {
    name: String,
    policies: Vec<String>,
    token_period: Duration,
    allowed_common_names: Vec<String>,
    common_name_matcher: Option<GlobSet>,
}

impl CertBinding {
    /// A binding called `name` granting `policies`, non-expiring tokens, and
    /// no common-name restriction.
    #[must_use]
    pub fn new(name: impl Into<String>, policies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            policies: policies.into_iter().map(Into::into).collect(),
            token_period: Duration::ZERO,
            allowed_common_names: Vec::new(),
            common_name_matcher: None,
        }
    }

    /// Set the token period. Zero means tokens never expire.
    #[must_use]
    pub fn with_token_period(mut self, period: Duration) -> Self {
        self.token_period = period;
        self
    }

    /// Restrict the binding to certificates whose common name matches one of
    /// `patterns` (glob syntax).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidBinding`] if a pattern does not compile.
    pub fn with_allowed_common_names(
        mut self,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> AuthResult<Self> {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            self.allowed_common_names.clear();
            self.common_name_matcher = None;
            return Ok(self);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                AuthError::InvalidBinding(format!("common name pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| AuthError::InvalidBinding(e.to_string()))?;

        self.allowed_common_names = patterns;
        self.common_name_matcher = Some(set);
        Ok(self)
    }

    /// Binding name (the role name in logs).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Granted policy names.
    #[must_use]
    pub fn policies(&self) -> &[String] {
        &self.policies
    }

    /// Token period.
    #[must_use]
    pub fn token_period(&self) -> Duration {
        self.token_period
    }

    /// Allowed common-name patterns (empty means any).
    #[must_use]
    pub fn allowed_common_names(&self) -> &[String] {
        &self.allowed_common_names
    }

    /// Whether a certificate with `common_name` may use this binding.
    #[must_use]
    pub fn allows_common_name(&self, common_name: &str) -> bool {
        self.common_name_matcher
            .as_ref()
            .is_none_or(|set| set.is_match(common_name))
    }
}

impl fmt::Debug for CertBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertBinding")
            .field("name", &self.name)
            .field("policies", &self.policies)
            .field("token_period", &self.token_period)
            .field("allowed_common_names", &self.allowed_common_names)
            .finish()
    }
}

/// Where a binding was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSource {
    /// Registered for this exact certificate.
    Certificate,
    /// Registered for the certificate's issuer.
    Issuer,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Certificate => f.write_str("certificate"),
            Self::Issuer => f.write_str("issuer"),
        }
    }
}

/// Binding tables keyed by certificate fingerprint and by issuer.
#[derive(Debug, Default)]
pub struct BindingRegistry {
    by_certificate: RwLock<HashMap<CertificateId, Arc<CertBinding>>>,
    by_issuer: RwLock<HashMap<KeyId, Arc<CertBinding>>>,
}

impl BindingRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind one certificate, replacing any previous binding for it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn bind_certificate(&self, id: CertificateId, binding: CertBinding) -> AuthResult<()> {
        let mut table = self
            .by_certificate
            .write()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        info!(
            certificate = %id,
            binding = %binding.name(),
            policies = ?binding.policies(),
            "Certificate binding registered"
        );
        table.insert(id, Arc::new(binding));
        Ok(())
    }

    /// Bind every certificate signed by `issuer`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn bind_issuer(&self, issuer: KeyId, binding: CertBinding) -> AuthResult<()> {
        let mut table = self
            .by_issuer
            .write()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        info!(
            issuer = %hex::encode(issuer),
            binding = %binding.name(),
            policies = ?binding.policies(),
            "Issuer binding registered"
        );
        table.insert(issuer, Arc::new(binding));
        Ok(())
    }

    /// Remove a certificate binding. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn unbind_certificate(&self, id: &CertificateId) -> AuthResult<bool> {
        let mut table = self
            .by_certificate
            .write()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(table.remove(id).is_some())
    }

    /// Remove an issuer binding. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the lock is poisoned.
    pub fn unbind_issuer(&self, issuer: &KeyId) -> AuthResult<bool> {
        let mut table = self
            .by_issuer
            .write()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(table.remove(issuer).is_some())
    }

    /// Find the binding for a certificate: by fingerprint, then by issuer.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if a lock is poisoned.
    pub fn lookup(
        &self,
        id: &CertificateId,
        issuer: &KeyId,
    ) -> AuthResult<Option<(BindingSource, Arc<CertBinding>)>> {
        let by_certificate = self
            .by_certificate
            .read()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if let Some(binding) = by_certificate.get(id) {
            return Ok(Some((BindingSource::Certificate, Arc::clone(binding))));
        }
        drop(by_certificate);

        let by_issuer = self
            .by_issuer
            .read()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(by_issuer
            .get(issuer)
            .map(|binding| (BindingSource::Issuer, Arc::clone(binding))))
    }
}
