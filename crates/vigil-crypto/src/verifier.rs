//! Trust anchors: the set of certificate-authority keys a binder accepts.
//!
//! A certificate names its issuer by [`KeyId`]. Verification looks the issuer
//! up here first, so a certificate from an unknown CA fails with
//! [`CryptoError::UntrustedKey`] before any signature math runs.

use std::collections::BTreeMap;

use crate::error::{CryptoError, CryptoResult};
use crate::keypair::PublicKey;
use crate::signature::Signature;

/// Key identifier (first 8 bytes of the public key).
pub type KeyId = [u8; 8];

/// Registry of trusted CA public keys, ordered by key id.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchor {
    keys: BTreeMap<KeyId, PublicKey>,
}

impl TrustAnchor {
    /// Create an empty trust anchor. It trusts nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a trust anchor from a list of keys.
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = PublicKey>) -> Self {
        let mut anchor = Self::new();
        for key in keys {
            anchor.add_trusted_key(key);
        }
        anchor
    }

    /// Trust a CA key. Returns its key id.
    pub fn add_trusted_key(&mut self, key: PublicKey) -> KeyId {
        let key_id = key.key_id();
        self.keys.insert(key_id, key);
        key_id
    }

    /// Stop trusting a CA key. Returns `true` if it was present.
    pub fn remove_trusted_key(&mut self, key_id: &KeyId) -> bool {
        self.keys.remove(key_id).is_some()
    }

    /// Whether a key id is trusted.
    #[must_use]
    pub fn is_trusted(&self, key_id: &KeyId) -> bool {
        self.keys.contains_key(key_id)
    }

    /// Look up a trusted key.
    #[must_use]
    pub fn get_key(&self, key_id: &KeyId) -> Option<&PublicKey> {
        self.keys.get(key_id)
    }

    /// Number of trusted keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are trusted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Trusted key ids in ascending order.
    #[must_use]
    pub fn key_ids(&self) -> Vec<KeyId> {
        self.keys.keys().copied().collect()
    }

    /// Verify `signature` over `message` with the trusted key `key_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UntrustedKey`] if the key is not trusted, or
    /// [`CryptoError::SignatureVerificationFailed`] if the signature is bad.
    pub fn verify(&self, key_id: &KeyId, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        let key = self
            .keys
            .get(key_id)
            .ok_or_else(|| CryptoError::UntrustedKey(hex::encode(key_id)))?;

        key.verify(message, signature)
    }

    /// Verify against every trusted key, returning the id of the one that
    /// signed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] if no trusted key
    /// produced the signature.
    pub fn verify_any(&self, message: &[u8], signature: &Signature) -> CryptoResult<KeyId> {
        self.keys
            .iter()
            .find(|(_, key)| key.verify(message, signature).is_ok())
            .map(|(key_id, _)| *key_id)
            .ok_or(CryptoError::SignatureVerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_empty_anchor_trusts_nothing() {
        let ca = KeyPair::generate();
        let anchor = TrustAnchor::new();
        let sig = ca.sign(b"cert");

        assert!(anchor.is_empty());
        assert!(matches!(
            anchor.verify(&ca.key_id(), b"cert", &sig),
            Err(CryptoError::UntrustedKey(id)) if id == ca.key_id_hex()
        ));
    }

    #[test]
    fn test_verify_with_trusted_key() {
        let ca = KeyPair::generate();
        let mut anchor = TrustAnchor::new();
        let id = anchor.add_trusted_key(ca.export_public_key());
        let sig = ca.sign(b"cert");

        assert!(anchor.verify(&id, b"cert", &sig).is_ok());
        assert!(matches!(
            anchor.verify(&id, b"tampered", &sig),
            Err(CryptoError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn test_remove_key() {
        let ca = KeyPair::generate();
        let mut anchor = TrustAnchor::from_keys([ca.export_public_key()]);
        let id = ca.key_id();

        assert!(anchor.is_trusted(&id));
        assert!(anchor.remove_trusted_key(&id));
        assert!(!anchor.remove_trusted_key(&id));
        assert!(anchor.get_key(&id).is_none());
    }

    #[test]
    fn test_verify_any_finds_signer() {
        let ca1 = KeyPair::generate();
        let ca2 = KeyPair::generate();
        let outsider = KeyPair::generate();
        let anchor = TrustAnchor::from_keys([ca1.export_public_key(), ca2.export_public_key()]);

        assert_eq!(anchor.len(), 2);
        assert_eq!(
            anchor.verify_any(b"msg", &ca2.sign(b"msg")).unwrap(),
            ca2.key_id()
        );
        assert!(anchor.verify_any(b"msg", &outsider.sign(b"msg")).is_err());
    }

    #[test]
    fn test_key_ids_sorted() {
        let anchor = TrustAnchor::from_keys((0..4).map(|_| KeyPair::generate().export_public_key()));
        let ids = anchor.key_ids();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
