//! Ed25519 key pairs and public keys.
//!
//! Certificate authorities and clients both hold a [`KeyPair`]. Only the
//! [`PublicKey`] half ever leaves the process: CA keys populate the trust
//! anchor, client keys are embedded in certificates.

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CryptoError, CryptoResult};
use crate::signature::Signature;
use crate::verifier::KeyId;

const PUBLIC_KEY_LEN: usize = 32;
const SECRET_KEY_LEN: usize = 32;

fn key_id_of(bytes: &[u8; PUBLIC_KEY_LEN]) -> KeyId {
    let mut id = [0u8; 8];
    id.copy_from_slice(&bytes[..8]);
    id
}

/// An Ed25519 key pair. The secret half is zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct KeyPair {
    #[zeroize(skip)]
    verifying_key: VerifyingKey,
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self {
            verifying_key: signing_key.verifying_key(),
            signing_key,
        }
    }

    /// Rebuild a key pair from its 32-byte secret.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if `bytes` is not 32 bytes.
    pub fn from_secret_key(bytes: &[u8]) -> CryptoResult<Self> {
        let mut secret: [u8; SECRET_KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SECRET_KEY_LEN,
                    actual: bytes.len(),
                })?;

        let signing_key = SigningKey::from_bytes(&secret);
        secret.zeroize();

        Ok(Self {
            verifying_key: signing_key.verifying_key(),
            signing_key,
        })
    }

    /// Rebuild a key pair from a hex-encoded secret, as written to `.pk` files.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not hex or not 32 bytes once decoded.
    pub fn from_secret_hex(s: &str) -> CryptoResult<Self> {
        let bytes =
            Zeroizing::new(hex::decode(s.trim()).map_err(|_| CryptoError::InvalidHexEncoding)?);
        Self::from_secret_key(&bytes)
    }

    /// Hex-encode the secret key. The returned buffer is zeroized on drop.
    #[must_use]
    pub fn secret_key_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signing_key.to_bytes());
        Zeroizing::new(hex::encode(*bytes))
    }

    /// Raw public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        self.verifying_key.as_bytes()
    }

    /// Short key identifier (first 8 bytes of the public key).
    #[must_use]
    pub fn key_id(&self) -> KeyId {
        key_id_of(self.public_key_bytes())
    }

    /// Key identifier as hex, for logs and config files.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(self.key_id())
    }

    /// Sign a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from(self.signing_key.sign(message))
    }

    /// Verify a signature made by this key pair.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] if verification fails.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        signature.verify(message, self.public_key_bytes())
    }

    /// The public half of this key pair.
    #[must_use]
    pub fn export_public_key(&self) -> PublicKey {
        PublicKey(*self.public_key_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id_hex())
            .finish_non_exhaustive()
    }
}

/// An Ed25519 public key (32 bytes). Serializes as hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    /// Create from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Try to create from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the slice is not 32 bytes.
    pub fn try_from_slice(slice: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; PUBLIC_KEY_LEN] =
            slice
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: PUBLIC_KEY_LEN,
                    actual: slice.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    /// Short key identifier (first 8 bytes).
    #[must_use]
    pub fn key_id(&self) -> KeyId {
        key_id_of(&self.0)
    }

    /// Key identifier as hex.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(self.key_id())
    }

    /// Encode as hex.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not hex or not 32 bytes once decoded.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|_| CryptoError::InvalidHexEncoding)?;
        Self::try_from_slice(&bytes)
    }

    /// Verify a signature made by the matching secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is malformed or the signature does not verify.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        signature.verify(message, &self.0)
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", self.key_id_hex())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let sig = keypair.sign(b"hello");
        assert!(keypair.verify(b"hello", &sig).is_ok());
        assert!(keypair.export_public_key().verify(b"hello", &sig).is_ok());
        assert!(keypair.verify(b"goodbye", &sig).is_err());
    }

    #[test]
    fn test_secret_hex_round_trip() {
        let keypair = KeyPair::generate();
        let restored = KeyPair::from_secret_hex(&keypair.secret_key_hex()).unwrap();
        assert_eq!(keypair.public_key_bytes(), restored.public_key_bytes());
    }

    #[test]
    fn test_secret_key_wrong_length() {
        assert!(matches!(
            KeyPair::from_secret_key(&[7u8; 31]),
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 31
            })
        ));
        assert!(matches!(
            KeyPair::from_secret_hex("zz"),
            Err(CryptoError::InvalidHexEncoding)
        ));
    }

    #[test]
    fn test_key_id_matches_public_key_prefix() {
        let keypair = KeyPair::generate();
        let public = keypair.export_public_key();
        assert_eq!(keypair.key_id(), public.key_id());
        assert_eq!(&public.as_bytes()[..8], &keypair.key_id());
        assert_eq!(public.key_id_hex().len(), 16);
    }

    #[test]
    fn test_public_key_serde_is_hex() {
        let public = KeyPair::generate().export_public_key();
        let json = serde_json::to_string(&public).unwrap();
        assert_eq!(json, format!("\"{}\"", public.to_hex()));
        let decoded: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, public);
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let keypair = KeyPair::generate();
        let debug = format!("{keypair:?}");
        assert!(!debug.contains(keypair.secret_key_hex().as_str()));
        assert!(debug.contains(&keypair.key_id_hex()));
    }
}
