//! Client certificates.
//!
//! A client certificate is a statement signed by a certificate authority:
//! "the holder of `public_key` is `common_name`, serial `serial`, valid from
//! `not_before` to `not_after`". The CA signs a canonical, length-prefixed
//! byte encoding of those fields. The certificate's identity is the
//! domain-separated BLAKE3 hash of the same bytes.
//!
//! Certificates travel as armored text:
//!
//! ```text
//! -----BEGIN VIGIL CERTIFICATE-----
//! eyJzZXJpYWwiOjEsImNvbW1vbl9uYW1lIjoidGVzdDEiLC4uLn0=
//! -----END VIGIL CERTIFICATE-----
//! ```

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use vigil_core::Timestamp;
use vigil_crypto::{ContentHash, CryptoError, KeyId, PublicKey, Signature, TrustAnchor};

use crate::error::{AuthError, AuthResult};

const SIGNING_DATA_VERSION: u8 = 0x01;
const FINGERPRINT_DOMAIN: &str = "vigil client certificate v1";
const CERTIFICATE_LABEL: &str = "VIGIL CERTIFICATE";
const CA_KEY_LABEL: &str = "VIGIL CA KEY";
const ARMOR_LINE_WIDTH: usize = 64;

fn write_length_prefixed(data: &mut Vec<u8>, bytes: &[u8]) {
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    data.extend_from_slice(&len.to_le_bytes());
    data.extend_from_slice(bytes);
}

/// Fingerprint identifying one certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CertificateId(pub ContentHash);

impl CertificateId {
    /// Hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Parse the hex form.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEncoding`] for malformed input.
    pub fn from_hex(s: &str) -> AuthResult<Self> {
        ContentHash::from_hex(s)
            .map(Self)
            .map_err(|e| AuthError::InvalidEncoding(e.to_string()))
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cert:{}", &self.to_hex()[..16])
    }
}

/// The signed fields of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateParams {
    /// Serial number, unique per issuer.
    pub serial: u64,
    /// Subject common name.
    pub common_name: String,
    /// Client public key.
    pub public_key: PublicKey,
    /// Issuing CA key id.
    #[serde(serialize_with = "ser_key_id", deserialize_with = "de_key_id")]
    pub issuer: KeyId,
    /// Start of validity.
    pub not_before: Timestamp,
    /// End of validity.
    pub not_after: Timestamp,
}

impl CertificateParams {
    /// Canonical bytes the issuer signs.
    #[must_use]
    pub fn signing_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(128);
        data.push(SIGNING_DATA_VERSION);
        data.extend_from_slice(&self.serial.to_le_bytes());
        write_length_prefixed(&mut data, self.common_name.as_bytes());
        data.extend_from_slice(self.public_key.as_bytes());
        data.extend_from_slice(&self.issuer);
        data.extend_from_slice(&self.not_before.unix().to_le_bytes());
        data.extend_from_slice(&self.not_after.unix().to_le_bytes());
        data
    }

    /// Fingerprint of these fields.
    #[must_use]
    pub fn fingerprint(&self) -> CertificateId {
        CertificateId(ContentHash::hash_with_domain(
            FINGERPRINT_DOMAIN,
            &self.signing_data(),
        ))
    }
}

/// A CA-signed client certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCertificate {
    #[serde(flatten)]
    params: CertificateParams,
    signature: Signature,
}

impl ClientCertificate {
    /// Assemble a certificate from its fields and the issuer's signature over
    /// [`CertificateParams::signing_data`].
    #[must_use]
    pub fn from_parts(params: CertificateParams, signature: Signature) -> Self {
        Self { params, signature }
    }

    /// Signed fields.
    #[must_use]
    pub fn params(&self) -> &CertificateParams {
        &self.params
    }

    /// Serial number.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.params.serial
    }

    /// Subject common name.
    #[must_use]
    pub fn common_name(&self) -> &str {
        &self.params.common_name
    }

    /// Issuing CA key id.
    #[must_use]
    pub fn issuer(&self) -> &KeyId {
        &self.params.issuer
    }

    /// Client public key.
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.params.public_key
    }

    /// Issuer signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Certificate fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> CertificateId {
        self.params.fingerprint()
    }

    /// Check the issuer is trusted and the signature holds.
    ///
    /// # Errors
    ///
    /// [`AuthError::UntrustedIssuer`] or [`AuthError::InvalidSignature`].
    pub fn verify(&self, anchor: &TrustAnchor) -> AuthResult<()> {
        anchor
            .verify(
                &self.params.issuer,
                &self.params.signing_data(),
                &self.signature,
            )
            .map_err(|e| match e {
                CryptoError::UntrustedKey(issuer) => AuthError::UntrustedIssuer { issuer },
                _ => AuthError::InvalidSignature,
            })
    }

    /// Check `now` falls inside the validity window, widened by `skew` on
    /// both ends.
    ///
    /// # Errors
    ///
    /// [`AuthError::CertificateNotYetValid`] or [`AuthError::CertificateExpired`].
    pub fn check_validity(&self, now: Timestamp, skew: Duration) -> AuthResult<()> {
        let skew = chrono::Duration::from_std(skew).unwrap_or_else(|_| chrono::Duration::zero());
        let earliest = now.0.checked_add_signed(skew).unwrap_or(now.0);
        let latest = now.0.checked_sub_signed(skew).unwrap_or(now.0);

        if earliest < self.params.not_before.0 {
            return Err(AuthError::CertificateNotYetValid {
                not_before: self.params.not_before.to_string(),
            });
        }
        if latest > self.params.not_after.0 {
            return Err(AuthError::CertificateExpired {
                not_after: self.params.not_after.to_string(),
            });
        }
        Ok(())
    }

    /// Encode as armored text.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEncoding`] if serialization fails.
    pub fn to_pem(&self) -> AuthResult<String> {
        let json = serde_json::to_vec(self).map_err(|e| AuthError::InvalidEncoding(e.to_string()))?;
        Ok(armor(
            CERTIFICATE_LABEL,
            &base64::engine::general_purpose::STANDARD.encode(json),
        ))
    }

    /// Decode armored text.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEncoding`] if the armor, base64, or body
    /// is malformed. The signature is not checked here.
    pub fn from_pem(text: &str) -> AuthResult<Self> {
        let body = dearmor(CERTIFICATE_LABEL, text)?;
        let json = base64::engine::general_purpose::STANDARD
            .decode(body)
            .map_err(|e| AuthError::InvalidEncoding(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| AuthError::InvalidEncoding(e.to_string()))
    }
}

/// Armor a CA public key, as written to `ca.pem`.
#[must_use]
pub fn ca_key_to_pem(key: &PublicKey) -> String {
    armor(CA_KEY_LABEL, &key.to_hex())
}

/// Read a CA public key from its armored form.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEncoding`] if the text is malformed.
pub fn ca_key_from_pem(text: &str) -> AuthResult<PublicKey> {
    let body = dearmor(CA_KEY_LABEL, text)?;
    PublicKey::from_hex(&body).map_err(|e| AuthError::InvalidEncoding(e.to_string()))
}

fn armor(label: &str, body: &str) -> String {
    let mut out = format!("-----BEGIN {label}-----\n");
    let mut rest = body;
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(ARMOR_LINE_WIDTH));
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out.push_str(&format!("-----END {label}-----\n"));
    out
}

fn dearmor(label: &str, text: &str) -> AuthResult<String> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let mut lines = text.lines().map(str::trim).skip_while(|l| l.is_empty());
    if lines.next() != Some(begin.as_str()) {
        return Err(AuthError::InvalidEncoding(format!("missing '{begin}'")));
    }

    let mut body = String::new();
    for line in lines {
        if line == end {
            return Ok(body);
        }
        body.push_str(line);
    }
    Err(AuthError::InvalidEncoding(format!("missing '{end}'")))
}

fn ser_key_id<S: Serializer>(id: &KeyId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(id))
}

fn de_key_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<KeyId, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_key_id(&s).map_err(serde::de::Error::custom)
}

/// Parse a 16-character hex key id.
///
/// # Errors
///
/// Returns [`AuthError::InvalidEncoding`] if the text is not 8 hex bytes.
pub fn parse_key_id(s: &str) -> AuthResult<KeyId> {
    let bytes = hex::decode(s.trim())
        .map_err(|_| AuthError::InvalidEncoding(format!("invalid hex in key id '{s}'")))?;
    bytes.as_slice().try_into().map_err(|_| {
        AuthError::InvalidEncoding(format!("key id must be 8 bytes, got {}", bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_crypto::KeyPair;

    fn issue(ca: &KeyPair, not_before: i64, not_after: i64) -> ClientCertificate {
        let client = KeyPair::generate();
        let params = CertificateParams {
            serial: 42,
            common_name: "test1".to_string(),
            public_key: client.export_public_key(),
            issuer: ca.key_id(),
            not_before: Timestamp::from_unix(not_before).unwrap(),
            not_after: Timestamp::from_unix(not_after).unwrap(),
        };
        let signature = ca.sign(&params.signing_data());
        ClientCertificate::from_parts(params, signature)
    }

    fn now_unix() -> i64 {
        Timestamp::now().unix()
    }

    #[test]
    fn test_verify_against_anchor() {
        let ca = KeyPair::generate();
        let cert = issue(&ca, now_unix() - 60, now_unix() + 3600);

        let anchor = TrustAnchor::from_keys([ca.export_public_key()]);
        assert!(cert.verify(&anchor).is_ok());

        let empty = TrustAnchor::new();
        assert!(matches!(
            cert.verify(&empty),
            Err(AuthError::UntrustedIssuer { .. })
        ));
    }

    #[test]
    fn test_tampered_fields_fail_signature() {
        let ca = KeyPair::generate();
        let cert = issue(&ca, now_unix() - 60, now_unix() + 3600);
        let mut params = cert.params().clone();
        params.common_name = "admin".to_string();
        let forged = ClientCertificate::from_parts(params, *cert.signature());

        let anchor = TrustAnchor::from_keys([ca.export_public_key()]);
        assert_eq!(forged.verify(&anchor), Err(AuthError::InvalidSignature));
        assert_ne!(forged.fingerprint(), cert.fingerprint());
    }

    #[test]
    fn test_validity_window() {
        let ca = KeyPair::generate();
        let now = Timestamp::now();

        let future = issue(&ca, now.unix() + 600, now.unix() + 3600);
        assert!(matches!(
            future.check_validity(now, Duration::ZERO),
            Err(AuthError::CertificateNotYetValid { .. })
        ));
        assert!(future.check_validity(now, Duration::from_secs(601)).is_ok());

        let past = issue(&ca, now.unix() - 3600, now.unix() - 600);
        assert!(matches!(
            past.check_validity(now, Duration::ZERO),
            Err(AuthError::CertificateExpired { .. })
        ));
    }

    #[test]
    fn test_pem_round_trip() {
        let ca = KeyPair::generate();
        let cert = issue(&ca, now_unix(), now_unix() + 10);
        let pem = cert.to_pem().unwrap();

        assert!(pem.starts_with("-----BEGIN VIGIL CERTIFICATE-----\n"));
        assert!(pem.lines().all(|l| l.len() <= 64 || l.starts_with("-----")));
        let decoded = ClientCertificate::from_pem(&pem).unwrap();
        assert_eq!(decoded.fingerprint(), cert.fingerprint());
        assert_eq!(decoded.issuer(), cert.issuer());
    }

    #[test]
    fn test_pem_rejects_garbage() {
        assert!(ClientCertificate::from_pem("hello").is_err());
        assert!(ClientCertificate::from_pem("-----BEGIN VIGIL CERTIFICATE-----\n!!!\n").is_err());
        assert!(
            ClientCertificate::from_pem(
                "-----BEGIN VIGIL CERTIFICATE-----\n!!!\n-----END VIGIL CERTIFICATE-----\n"
            )
            .is_err()
        );
    }

    #[test]
    fn test_ca_key_pem() {
        let ca = KeyPair::generate();
        let pem = ca_key_to_pem(&ca.export_public_key());
        assert_eq!(ca_key_from_pem(&pem).unwrap(), ca.export_public_key());
    }

    #[test]
    fn test_parse_key_id() {
        let ca = KeyPair::generate();
        assert_eq!(parse_key_id(&ca.key_id_hex()).unwrap(), ca.key_id());
        assert!(parse_key_id("abc").is_err());
        assert!(parse_key_id("zzzzzzzzzzzzzzzz").is_err());
    }
}
