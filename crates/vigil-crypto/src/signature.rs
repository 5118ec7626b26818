//! Detached Ed25519 signatures.
//!
//! A certificate authority signs the canonical bytes of each client
//! certificate; binders verify that signature against the trust anchor.

use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CryptoError, CryptoResult};

/// Length of an Ed25519 signature in bytes.
const SIGNATURE_LEN: usize = 64;

/// An Ed25519 signature (64 bytes).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    /// Create from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Try to create from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSignatureLength`] if the slice is not 64 bytes.
    pub fn try_from_slice(slice: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; SIGNATURE_LEN] =
            slice
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureLength {
                    expected: SIGNATURE_LEN,
                    actual: slice.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Encode as hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Encode as standard base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.0)
    }

    /// Decode from standard base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not base64 or not 64 bytes long.
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|_| CryptoError::InvalidBase64Encoding)?;
        Self::try_from_slice(&bytes)
    }

    /// Verify this signature over `message` with a raw public key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key bytes are not a valid point or the
    /// signature does not verify.
    pub fn verify(&self, message: &[u8], public_key: &[u8; 32]) -> CryptoResult<()> {
        let verifying_key = VerifyingKey::from_bytes(public_key)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

        verifying_key
            .verify(message, &DalekSignature::from_bytes(&self.0))
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &self.to_hex()[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

impl From<DalekSignature> for Signature {
    fn from(sig: DalekSignature) -> Self {
        Self(sig.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_signature_base64_encoding() {
        let keypair = KeyPair::generate();
        let sig = keypair.sign(b"cert bytes");

        let decoded = Signature::from_base64(&sig.to_base64()).unwrap();
        assert_eq!(sig, decoded);
    }

    #[test]
    fn test_signature_rejects_other_key() {
        let ca = KeyPair::generate();
        let impostor = KeyPair::generate();
        let sig = ca.sign(b"cert bytes");

        assert!(sig.verify(b"cert bytes", ca.public_key_bytes()).is_ok());
        assert!(
            sig.verify(b"cert bytes", impostor.public_key_bytes())
                .is_err()
        );
        assert!(sig.verify(b"other bytes", ca.public_key_bytes()).is_err());
    }

    #[test]
    fn test_invalid_signature_length() {
        assert!(matches!(
            Signature::try_from_slice(&[0u8; 12]),
            Err(CryptoError::InvalidSignatureLength {
                expected: 64,
                actual: 12
            })
        ));
    }

    #[test]
    fn test_signature_serde() {
        let keypair = KeyPair::generate();
        let sig = keypair.sign(b"payload");
        let json = serde_json::to_string(&sig).unwrap();
        let decoded: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, decoded);
    }
}
