//! Certificate revocation checks.
//!
//! The binder asks a [`RevocationChecker`] about every certificate it
//! accepts. Checkers may do I/O; the binder bounds each call with a timeout
//! and treats errors and timeouts as rejection.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;
use thiserror::Error;

use crate::certificate::ClientCertificate;

/// Answer from a revocation checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStatus {
    /// Not revoked.
    Good,
    /// Revoked.
    Revoked,
}

/// A checker could not determine revocation status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct RevocationError(pub String);

/// Source of revocation information.
#[async_trait]
pub trait RevocationChecker: Send + Sync {
    /// Report whether `certificate` is revoked.
    async fn check(
        &self,
        certificate: &ClientCertificate,
    ) -> Result<RevocationStatus, RevocationError>;
}

/// A checker that never revokes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRevocation;

#[async_trait]
impl RevocationChecker for NoRevocation {
    async fn check(&self, _: &ClientCertificate) -> Result<RevocationStatus, RevocationError> {
        Ok(RevocationStatus::Good)
    }
}

/// In-memory list of revoked serial numbers.
#[derive(Debug, Default)]
pub struct SerialRevocationList {
    serials: RwLock<HashSet<u64>>,
}

impl SerialRevocationList {
    /// Create a list from known revoked serials.
    #[must_use]
    pub fn new(serials: impl IntoIterator<Item = u64>) -> Self {
        Self {
            serials: RwLock::new(serials.into_iter().collect()),
        }
    }

    /// Revoke a serial.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn revoke(&self, serial: u64) -> Result<(), RevocationError> {
        self.serials
            .write()
            .map_err(|e| RevocationError(e.to_string()))?
            .insert(serial);
        Ok(())
    }

    /// Number of revoked serials.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn len(&self) -> Result<usize, RevocationError> {
        Ok(self
            .serials
            .read()
            .map_err(|e| RevocationError(e.to_string()))?
            .len())
    }

    /// Whether no serials are revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, RevocationError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl RevocationChecker for SerialRevocationList {
    async fn check(
        &self,
        certificate: &ClientCertificate,
    ) -> Result<RevocationStatus, RevocationError> {
        let serials = self
            .serials
            .read()
            .map_err(|e| RevocationError(e.to_string()))?;
        if serials.contains(&certificate.serial()) {
            Ok(RevocationStatus::Revoked)
        } else {
            Ok(RevocationStatus::Good)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::CertificateParams;
    use vigil_core::Timestamp;
    use vigil_crypto::KeyPair;

    fn cert(serial: u64) -> ClientCertificate {
        let ca = KeyPair::generate();
        let params = CertificateParams {
            serial,
            common_name: "test1".to_string(),
            public_key: KeyPair::generate().export_public_key(),
            issuer: ca.key_id(),
            not_before: Timestamp::now(),
            not_after: Timestamp::now(),
        };
        let sig = ca.sign(&params.signing_data());
        ClientCertificate::from_parts(params, sig)
    }

    #[tokio::test]
    async fn test_no_revocation() {
        assert_eq!(
            NoRevocation.check(&cert(1)).await.unwrap(),
            RevocationStatus::Good
        );
    }

    #[tokio::test]
    async fn test_serial_list() {
        let list = SerialRevocationList::new([3]);
        assert_eq!(list.check(&cert(3)).await.unwrap(), RevocationStatus::Revoked);
        assert_eq!(list.check(&cert(4)).await.unwrap(), RevocationStatus::Good);

        list.revoke(4).unwrap();
        assert_eq!(list.len().unwrap(), 2);
        assert_eq!(list.check(&cert(4)).await.unwrap(), RevocationStatus::Revoked);
    }
}
