//! Cert command: inspect an armored client certificate.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use vigil_auth::{AuthError, ClientCertificate};
use vigil_config::Config;
use vigil_core::Timestamp;

use crate::config_bridge;
use crate::theme::Theme;

/// Print a certificate's fields and whether the configured CAs accept it.
pub(crate) fn inspect_certificate(config: &Config, cert_path: &Path) -> Result<()> {
    let pem = std::fs::read_to_string(cert_path)
        .with_context(|| format!("failed to read {}", cert_path.display()))?;
    let cert = ClientCertificate::from_pem(&pem)?;

    println!("{}", Theme::header("Client certificate"));
    println!("  Common name: {}", cert.common_name());
    println!("  Serial:      {}", cert.serial());
    println!("  Issuer:      {}", hex::encode(cert.issuer()));
    println!("  Not before:  {}", cert.params().not_before);
    println!("  Not after:   {}", cert.params().not_after);
    println!("  Fingerprint: {}", cert.fingerprint().to_hex());

    println!("{}", trust_verdict(config, &cert, Timestamp::now())?);
    Ok(())
}

/// One line on whether `cert` would authenticate at `now`.
///
/// A trusted certificate outside its validity window is a warning, not an
/// error: it is the right certificate at the wrong time.
fn trust_verdict(config: &Config, cert: &ClientCertificate, now: Timestamp) -> Result<String> {
    let binder_config = config_bridge::to_binder_config(config)?;
    if let Err(e) = cert.verify(&binder_config.trust_anchor) {
        return Ok(Theme::error(&e.to_string()));
    }

    let skew = Duration::from_secs(config.auth.clock_skew_secs);
    Ok(match cert.check_validity(now, skew) {
        Ok(()) => Theme::success("Trusted and currently valid"),
        Err(
            e @ (AuthError::CertificateNotYetValid { .. } | AuthError::CertificateExpired { .. }),
        ) => Theme::warning(&format!("Trusted, but {e}")),
        Err(e) => Theme::error(&e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_test::TestAuthority;

    fn trusting(ca: &TestAuthority) -> Config {
        let mut cfg = Config::default();
        cfg.auth.trusted_cas = vec![ca.public_key().to_hex()];
        cfg
    }

    #[test]
    fn test_verdict_trusted_and_valid() {
        let ca = TestAuthority::new();
        let cert = ca.issue("test1").certificate;
        let line = trust_verdict(&trusting(&ca), &cert, Timestamp::now()).unwrap();
        assert!(line.contains("Trusted and currently valid"));
    }

    #[test]
    fn test_verdict_expired_is_warning() {
        let ca = TestAuthority::new();
        let cert = ca
            .issue_expired("test1", Duration::from_secs(7200))
            .certificate;
        let line = trust_verdict(&trusting(&ca), &cert, Timestamp::now()).unwrap();
        assert!(line.contains("Trusted, but certificate expired"));
    }

    #[test]
    fn test_verdict_untrusted_is_error() {
        let ca = TestAuthority::new();
        let stranger = TestAuthority::new();
        let cert = stranger.issue("test1").certificate;
        let line = trust_verdict(&trusting(&ca), &cert, Timestamp::now()).unwrap();
        assert!(line.contains("is not trusted"));
        assert!(!line.contains("Trusted"));
    }
}
