//! Token issue, expiry and renewal through the evaluator, on a paused clock.

use std::time::Duration;

use vigil_access::AccessError;
use vigil_auth::{AuthError, Credential};
use vigil_core::Operation;
use vigil_test::TestHarness;

const TEN_YEARS: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

#[tokio::test(start_paused = true)]
async fn test_zero_period_token_never_expires() {
    let harness = TestHarness::new().unwrap();
    let identity = harness
        .binder()
        .bind(&harness.client_credential())
        .await
        .unwrap();
    assert!(identity.token_period().is_zero());
    assert_eq!(identity.policies(), ["kv-policy", "tag-policy"]);

    tokio::time::advance(TEN_YEARS).await;

    let token = Credential::Token(identity.token().unwrap().clone());
    let decision = harness
        .evaluator()
        .authorize(&token, "kv/data/foo", Operation::Read)
        .await
        .unwrap();
    assert!(decision.allowed);
}

#[tokio::test(start_paused = true)]
async fn test_period_token_expires_after_period() {
    let harness = TestHarness::builder()
        .token_period(Duration::from_secs(60))
        .build()
        .unwrap();
    let identity = harness
        .binder()
        .bind(&harness.client_credential())
        .await
        .unwrap();
    let token = Credential::Token(identity.token().unwrap().clone());

    tokio::time::advance(Duration::from_secs(60)).await;
    assert!(
        harness
            .evaluator()
            .authorize(&token, "kv/data/foo", Operation::Read)
            .await
            .unwrap()
            .allowed
    );

    tokio::time::advance(Duration::from_secs(1)).await;
    let err = harness
        .evaluator()
        .authorize(&token, "kv/data/foo", Operation::Read)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Auth(AuthError::TokenExpired)));
    assert_eq!(harness.evaluator().stats().auth_failures, 1);

    // The certificate itself still binds and mints a fresh token.
    let fresh = harness
        .binder()
        .bind(&harness.client_credential())
        .await
        .unwrap();
    assert_ne!(fresh.token(), identity.token());
}

#[tokio::test(start_paused = true)]
async fn test_renewal_extends_period_token() {
    let harness = TestHarness::builder()
        .token_period(Duration::from_secs(60))
        .build()
        .unwrap();
    let identity = harness
        .binder()
        .bind(&harness.client_credential())
        .await
        .unwrap();

    for _ in 0..5 {
        tokio::time::advance(Duration::from_secs(45)).await;
        harness.binder().renew(identity.token().unwrap()).unwrap();
    }

    let token = Credential::Token(identity.token().unwrap().clone());
    assert!(
        harness
            .evaluator()
            .authorize(&token, "kv/data/foo", Operation::Read)
            .await
            .unwrap()
            .allowed
    );
}

#[tokio::test]
async fn test_revoked_token_is_unknown() {
    let harness = TestHarness::new().unwrap();
    let identity = harness
        .binder()
        .bind(&harness.client_credential())
        .await
        .unwrap();
    assert!(harness.binder().revoke_token(identity.token().unwrap()).unwrap());

    let err = harness
        .evaluator()
        .authorize(
            &Credential::Token(identity.token().unwrap().clone()),
            "kv/data/foo",
            Operation::Read,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Auth(AuthError::UnknownToken)));
}

#[tokio::test]
async fn test_certificate_authorizations_do_not_accumulate_tokens() {
    let harness = TestHarness::new().unwrap();
    let cred = harness.client_credential();
    let tokens = harness.binder().tokens();

    for _ in 0..1000 {
        let decision = harness
            .evaluator()
            .authorize(&cred, "kv/data/foo", Operation::Read)
            .await
            .unwrap();
        assert!(decision.allowed);
    }
    assert_eq!(tokens.len().unwrap(), 0);

    // only an explicit login stores a token
    harness.binder().bind(&cred).await.unwrap();
    assert_eq!(tokens.len().unwrap(), 1);
    assert_eq!(tokens.purge_expired().unwrap(), 0);
}
