//! Authentication failures never reach the resolver.

use std::sync::Arc;
use std::time::Duration;

use vigil_access::AccessError;
use vigil_auth::{AuthError, CertBinding, SerialRevocationList};
use vigil_core::Operation;
use vigil_test::{
    CountingRevocation, FailingRevocation, SlowRevocation, TestAuthority, TestHarness,
};

async fn assert_auth_failure(harness: &TestHarness, cred: vigil_auth::Credential) -> AuthError {
    let err = harness
        .evaluator()
        .authorize(&cred, "kv/data/foo", Operation::Read)
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "permission denied");
    let stats = harness.evaluator().stats();
    assert_eq!(stats.decisions, 0, "resolver must not run");
    match err {
        AccessError::Auth(e) => e,
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_untrusted_certificate() {
    let harness = TestHarness::new().unwrap();
    let stranger = TestAuthority::new().issue("test1");

    let err = assert_auth_failure(&harness, stranger.credential()).await;
    assert!(matches!(err, AuthError::UntrustedIssuer { .. }));
    assert_eq!(harness.evaluator().stats().auth_failures, 1);
}

#[tokio::test]
async fn test_forged_certificate() {
    let harness = TestHarness::new().unwrap();
    let forged = TestAuthority::forge(&harness.client().certificate, "admin");

    let err = assert_auth_failure(&harness, forged.into()).await;
    assert_eq!(err, AuthError::InvalidSignature);
}

#[tokio::test]
async fn test_expired_certificate() {
    let harness = TestHarness::new().unwrap();
    let expired = harness
        .authority()
        .issue_expired("test1", Duration::from_secs(3600));

    let err = assert_auth_failure(&harness, expired.credential()).await;
    assert!(matches!(err, AuthError::CertificateExpired { .. }));
}

#[tokio::test]
async fn test_revoked_serial() {
    let list = Arc::new(SerialRevocationList::default());
    let harness = TestHarness::builder()
        .revocation_checker(list.clone())
        .build()
        .unwrap();
    list.revoke(harness.client().certificate.serial()).unwrap();

    let err = assert_auth_failure(&harness, harness.client_credential()).await;
    assert!(matches!(err, AuthError::CertificateRevoked { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_revocation_timeout_fails_closed() {
    let harness = TestHarness::builder()
        .revocation_checker(Arc::new(SlowRevocation::new(Duration::from_secs(30))))
        .revocation_timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = assert_auth_failure(&harness, harness.client_credential()).await;
    assert_eq!(err, AuthError::RevocationTimeout);
}

#[tokio::test]
async fn test_revocation_error_fails_closed() {
    let harness = TestHarness::builder()
        .revocation_checker(Arc::new(FailingRevocation::default()))
        .build()
        .unwrap();

    let err = assert_auth_failure(&harness, harness.client_credential()).await;
    assert!(matches!(err, AuthError::RevocationCheckFailed(_)));
}

#[tokio::test]
async fn test_revocation_checked_per_certificate_bind() {
    let counter = Arc::new(CountingRevocation::new());
    let harness = TestHarness::builder()
        .revocation_checker(counter.clone())
        .build()
        .unwrap();
    let cred = harness.client_credential();

    for _ in 0..3 {
        harness
            .evaluator()
            .authorize(&cred, "kv/data/foo", Operation::Read)
            .await
            .unwrap();
    }
    assert_eq!(counter.calls(), 3);

    // Token requests skip the check.
    let identity = harness.binder().bind(&cred).await.unwrap();
    let token = vigil_auth::Credential::Token(identity.token().unwrap().clone());
    harness
        .evaluator()
        .authorize(&token, "kv/data/foo", Operation::Read)
        .await
        .unwrap();
    assert_eq!(counter.calls(), 4);
}

#[tokio::test]
async fn test_unbound_certificate() {
    let harness = TestHarness::new().unwrap();
    harness
        .binder()
        .unbind_issuer(&harness.authority().key_id())
        .unwrap();

    let err = assert_auth_failure(&harness, harness.client_credential()).await;
    assert!(matches!(err, AuthError::NoBinding { .. }));
}

#[tokio::test]
async fn test_certificate_binding_overrides_issuer() {
    let harness = TestHarness::new().unwrap();
    let cert = &harness.client().certificate;
    harness
        .binder()
        .bind_certificate(
            cert.fingerprint(),
            CertBinding::new("pinned", ["tag-policy"]),
        )
        .unwrap();

    let identity = harness
        .binder()
        .bind(&harness.client_credential())
        .await
        .unwrap();
    assert_eq!(identity.binding(), "pinned");
    assert_eq!(identity.policies(), ["tag-policy"]);

    // tag-policy alone carries no deny for kv/internal/bad.
    let decision = harness
        .evaluator()
        .authorize(&harness.client_credential(), "kv/internal/bad", Operation::Read)
        .await
        .unwrap();
    assert!(decision.allowed);
}

#[tokio::test]
async fn test_common_name_restriction() {
    let harness = TestHarness::new().unwrap();
    harness
        .binder()
        .bind_issuer(
            harness.authority().key_id(),
            CertBinding::new("test", ["kv-policy"])
                .with_allowed_common_names(["web-*"])
                .unwrap(),
        )
        .unwrap();

    let err = assert_auth_failure(&harness, harness.client_credential()).await;
    assert!(matches!(err, AuthError::CommonNameNotAllowed { .. }));

    let web = harness.authority().issue("web-01");
    assert!(
        harness
            .evaluator()
            .authorize(&web.credential(), "kv/data/foo", Operation::Read)
            .await
            .unwrap()
            .allowed
    );
}
