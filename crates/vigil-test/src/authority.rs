//! A throwaway certificate authority.

use std::time::Duration;

use vigil_auth::{AuthResult, CertificateParams, ClientCertificate, Credential, ca_key_to_pem};
use vigil_core::Timestamp;
use vigil_crypto::{KeyId, KeyPair, PublicKey, TrustAnchor};

const PRIVATE_KEY_LABEL: &str = "VIGIL PRIVATE KEY";

/// A certificate together with the client key it certifies.
#[derive(Debug)]
pub struct IssuedCertificate {
    /// The signed certificate.
    pub certificate: ClientCertificate,
    /// The client's key pair.
    pub key: KeyPair,
}

impl IssuedCertificate {
    /// The certificate as a credential.
    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential::Certificate(self.certificate.clone())
    }

    /// Armored private key text.
    #[must_use]
    pub fn private_key_pem(&self) -> String {
        let hex = self.key.secret_key_hex();
        format!(
            "-----BEGIN {PRIVATE_KEY_LABEL}-----\n{}\n-----END {PRIVATE_KEY_LABEL}-----\n",
            hex.as_str()
        )
    }
}

/// Issues client certificates signed by a freshly generated CA key.
#[derive(Debug)]
pub struct TestAuthority {
    key: KeyPair,
    next_serial: std::sync::atomic::AtomicU64,
}

impl Default for TestAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAuthority {
    /// Generate a new CA.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key: KeyPair::generate(),
            next_serial: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// CA public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        self.key.export_public_key()
    }

    /// CA key id, the issuer of every certificate it signs.
    #[must_use]
    pub fn key_id(&self) -> KeyId {
        self.key.key_id()
    }

    /// A trust anchor containing only this CA.
    #[must_use]
    pub fn trust_anchor(&self) -> TrustAnchor {
        TrustAnchor::from_keys([self.public_key()])
    }

    /// Armored CA public key.
    #[must_use]
    pub fn ca_pem(&self) -> String {
        ca_key_to_pem(&self.public_key())
    }

    /// Issue a certificate valid from a minute ago for an hour.
    #[must_use]
    pub fn issue(&self, common_name: &str) -> IssuedCertificate {
        let now = Timestamp::now().unix();
        self.issue_with_window(common_name, now.saturating_sub(60), now.saturating_add(3600))
    }

    /// Issue a certificate with an explicit validity window in unix seconds.
    #[must_use]
    pub fn issue_with_window(
        &self,
        common_name: &str,
        not_before: i64,
        not_after: i64,
    ) -> IssuedCertificate {
        let serial = self
            .next_serial
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.issue_with_serial(common_name, serial, not_before, not_after)
    }

    /// Issue a certificate with a fixed serial.
    #[must_use]
    pub fn issue_with_serial(
        &self,
        common_name: &str,
        serial: u64,
        not_before: i64,
        not_after: i64,
    ) -> IssuedCertificate {
        let key = KeyPair::generate();
        let params = CertificateParams {
            serial,
            common_name: common_name.to_string(),
            public_key: key.export_public_key(),
            issuer: self.key_id(),
            not_before: Timestamp::from_unix(not_before).unwrap_or_else(Timestamp::now),
            not_after: Timestamp::from_unix(not_after).unwrap_or_else(Timestamp::now),
        };
        let signature = self.key.sign(&params.signing_data());
        IssuedCertificate {
            certificate: ClientCertificate::from_parts(params, signature),
            key,
        }
    }

    /// Issue a certificate that expired `ago` before now.
    #[must_use]
    pub fn issue_expired(&self, common_name: &str, ago: Duration) -> IssuedCertificate {
        let now = Timestamp::now().unix();
        let ago = i64::try_from(ago.as_secs()).unwrap_or(i64::MAX);
        let not_after = now.saturating_sub(ago);
        self.issue_with_window(common_name, not_after.saturating_sub(3600), not_after)
    }

    /// Swap the common name of `certificate`, keeping the original
    /// signature. The result no longer verifies.
    #[must_use]
    pub fn forge(certificate: &ClientCertificate, common_name: &str) -> ClientCertificate {
        let mut params = certificate.params().clone();
        params.common_name = common_name.to_string();
        ClientCertificate::from_parts(params, *certificate.signature())
    }

    /// Round-trip a certificate through its armored text.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or decoding fails.
    pub fn reparse(certificate: &ClientCertificate) -> AuthResult<ClientCertificate> {
        ClientCertificate::from_pem(&certificate.to_pem()?)
    }
}
