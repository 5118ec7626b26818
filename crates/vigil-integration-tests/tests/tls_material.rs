//! Client TLS material written to disk and read back.

use vigil_auth::{ClientCertificate, Credential, ca_key_from_pem};
use vigil_core::Operation;
use vigil_crypto::KeyPair;
use vigil_test::TestHarness;

fn read(path: &std::path::Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_written_material_reloads() {
    let harness = TestHarness::new().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("tls");

    harness.write_tls_material(&dir).unwrap();

    let ca = ca_key_from_pem(&read(&dir.join("ca/ca.pem"))).unwrap();
    assert_eq!(ca, harness.authority().public_key());

    let cert = ClientCertificate::from_pem(&read(&dir.join("test1/test1.pem"))).unwrap();
    assert_eq!(cert, harness.client().certificate);
    assert_eq!(cert.fingerprint(), harness.client().certificate.fingerprint());

    let pk = read(&dir.join("test1/test1.pk"));
    let hex = pk.lines().nth(1).unwrap();
    let key = KeyPair::from_secret_hex(hex).unwrap();
    assert_eq!(&key.export_public_key(), cert.public_key());

    let decision = harness
        .evaluator()
        .authorize(&Credential::Certificate(cert), "kv/data/foo", Operation::Read)
        .await
        .unwrap();
    assert!(decision.allowed);
}

#[test]
fn test_rewrite_clears_previous_material() {
    let first = TestHarness::new().unwrap();
    let second = TestHarness::new().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("tls");

    first.write_tls_material(&dir).unwrap();
    std::fs::write(dir.join("leftover.txt"), "stale").unwrap();
    second.write_tls_material(&dir).unwrap();

    assert!(!dir.join("leftover.txt").exists());
    let ca = ca_key_from_pem(&read(&dir.join("ca/ca.pem"))).unwrap();
    assert_eq!(ca, second.authority().public_key());
}

#[test]
fn test_armored_certificate_round_trip_is_stable() {
    let harness = TestHarness::new().unwrap();
    let cert = &harness.client().certificate;
    let reparsed = vigil_test::TestAuthority::reparse(cert).unwrap();
    assert_eq!(reparsed.to_pem().unwrap(), cert.to_pem().unwrap());
}
