//! End-to-end decisions against the reference deployment: a CA-wide binding
//! granting `kv-policy` and `tag-policy` to the `test1` client.

use std::sync::Arc;

use vigil_core::{Capability, Operation};
use vigil_policy::{DecisionReason, DenyMode, PolicyBuilder, ResolverConfig};
use vigil_test::{TestHarness, init_test_logging, tag_policy};

// ---------------------------------------------------------------------------
// Reference scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_kv_data_read_allowed() {
    init_test_logging();
    let harness = TestHarness::new().unwrap();
    let cred = harness.client_credential();

    let decision = harness
        .evaluator()
        .authorize(&cred, "kv/data/foo", Operation::Read)
        .await
        .unwrap();

    assert!(decision.allowed);
    assert_eq!(decision.reason, DecisionReason::Granted);
    let matched = decision.matched.unwrap();
    assert_eq!(matched.policy, "kv-policy");
    assert_eq!(matched.pattern, "kv/data/*");
}

#[tokio::test]
async fn test_explicit_deny_beats_broader_allows() {
    let harness = TestHarness::new().unwrap();
    let cred = harness.client_credential();

    for op in Operation::ALL {
        let decision = harness
            .evaluator()
            .authorize(&cred, "kv/internal/bad", op)
            .await
            .unwrap();
        assert!(!decision.allowed, "{op} on kv/internal/bad");
        assert_eq!(decision.reason, DecisionReason::ExplicitDeny);
    }

    // Siblings of the denied path stay reachable through kv/*.
    let sibling = harness
        .evaluator()
        .authorize(&cred, "kv/internal/good", Operation::Read)
        .await
        .unwrap();
    assert!(sibling.allowed);
}

#[tokio::test]
async fn test_literal_rule_beats_wildcard() {
    let harness = TestHarness::new().unwrap();
    let cred = harness.client_credential();

    // `*` grants sudo, but the literal sys/tools/random rule does not.
    let decision = harness
        .evaluator()
        .authorize(&cred, "sys/tools/random", Operation::Sudo)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::MissingCapability);
    assert_eq!(decision.matched.unwrap().pattern, "sys/tools/random");

    let other = harness
        .evaluator()
        .authorize(&cred, "sys/mounts", Operation::Sudo)
        .await
        .unwrap();
    assert!(other.allowed);
    assert_eq!(other.matched.unwrap().pattern, "*");
}

#[tokio::test]
async fn test_leading_slash_rules() {
    let harness = TestHarness::new().unwrap();
    let cred = harness.client_credential();

    let lookup = harness
        .evaluator()
        .authorize(&cred, "auth/token/lookup-self", Operation::Read)
        .await
        .unwrap();
    assert!(lookup.allowed);
    assert_eq!(lookup.matched.unwrap().pattern, "/auth/token/lookup-self");

    let transit = harness
        .evaluator()
        .authorize(&cred, "transit/", Operation::Update)
        .await
        .unwrap();
    assert!(transit.allowed);
    assert_eq!(transit.matched.unwrap().pattern, "/transit/");
}

#[tokio::test]
async fn test_sudo_paths() {
    let harness = TestHarness::builder()
        .resolver(ResolverConfig::default().with_sudo_path("sys/tools/random"))
        .build()
        .unwrap();
    let cred = harness.client_credential();

    let decision = harness
        .evaluator()
        .authorize(&cred, "sys/tools/random", Operation::Read)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::SudoRequired);

    let token_create = harness
        .evaluator()
        .authorize(&cred, "auth/token/create", Operation::Create)
        .await
        .unwrap();
    assert!(token_create.allowed);
}

#[tokio::test]
async fn test_no_matching_rule_denies() {
    let harness = TestHarness::new().unwrap();
    // Replace kv-policy so nothing covers the top level any more.
    harness
        .policies()
        .put_policy(
            PolicyBuilder::new("kv-policy")
                .path("kv/data/*")
                .capabilities([Capability::Read])
                .build()
                .unwrap(),
        )
        .unwrap();

    let decision = harness
        .evaluator()
        .authorize(&harness.client_credential(), "secret/foo", Operation::Read)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::NoMatchingRule);
    assert!(decision.matched.is_none());
}

#[tokio::test]
async fn test_unknown_bound_policies_deny_everything() {
    let harness = TestHarness::new().unwrap();
    harness.policies().delete("kv-policy").unwrap();
    harness.policies().delete("tag-policy").unwrap();

    let decision = harness
        .evaluator()
        .authorize(&harness.client_credential(), "kv/data/foo", Operation::Read)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::NoPolicies);
}

// ---------------------------------------------------------------------------
// Precedence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_equal_specificity_most_recent_wins() {
    let harness = TestHarness::new().unwrap();
    let cred = harness.client_credential();

    // tag-policy re-registered with a kv/data/* rule as specific as
    // kv-policy's, granting list only.
    harness
        .policies()
        .put_policy(
            PolicyBuilder::new("tag-policy")
                .path("kv/data/*")
                .capabilities([Capability::List])
                .build()
                .unwrap(),
        )
        .unwrap();

    let decision = harness
        .evaluator()
        .authorize(&cred, "kv/data/foo", Operation::Update)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.matched.as_ref().unwrap().policy, "tag-policy");

    // Re-registering kv-policy makes it the most recent again.
    harness
        .policies()
        .put_policy(vigil_test::kv_policy().unwrap())
        .unwrap();
    let decision = harness
        .evaluator()
        .authorize(&cred, "kv/data/foo", Operation::Update)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.matched.unwrap().policy, "kv-policy");
}

#[tokio::test]
async fn test_deny_modes() {
    let lockdown = || {
        let mut policy = PolicyBuilder::new("tag-policy").path("kv/*").deny();
        for rule in tag_policy().unwrap().rules() {
            policy = policy.rule(rule.clone());
        }
        policy.build().unwrap()
    };

    let absolute = TestHarness::new().unwrap();
    absolute.policies().put_policy(lockdown()).unwrap();
    let decision = absolute
        .evaluator()
        .authorize(&absolute.client_credential(), "kv/data/foo", Operation::Read)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.reason, DecisionReason::ExplicitDeny);

    let most_specific = TestHarness::builder()
        .resolver(ResolverConfig::default().with_deny_mode(DenyMode::MostSpecific))
        .build()
        .unwrap();
    most_specific.policies().put_policy(lockdown()).unwrap();
    let decision = most_specific
        .evaluator()
        .authorize(
            &most_specific.client_credential(),
            "kv/data/foo",
            Operation::Read,
        )
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.matched.unwrap().pattern, "kv/data/*");

    // kv/other is decided by the kv/* deny in both modes.
    let decision = most_specific
        .evaluator()
        .authorize(&most_specific.client_credential(), "kv/other", Operation::Read)
        .await
        .unwrap();
    assert!(!decision.allowed);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decisions_agree() {
    let harness = Arc::new(TestHarness::new().unwrap());
    let mut handles = Vec::new();

    for i in 0..64 {
        let harness = Arc::clone(&harness);
        handles.push(tokio::spawn(async move {
            let cred = harness.client_credential();
            let evaluator = harness.evaluator();
            let allowed = evaluator
                .authorize(&cred, "kv/data/foo", Operation::Read)
                .await
                .unwrap()
                .allowed;
            let denied = evaluator
                .authorize(&cred, "kv/internal/bad", Operation::Read)
                .await
                .unwrap()
                .allowed;
            if i % 8 == 0 {
                // Concurrent admin writes that leave the rule set unchanged.
                harness
                    .policies()
                    .put_policy(tag_policy().unwrap())
                    .unwrap();
            }
            (allowed, denied)
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), (true, false));
    }

    let stats = harness.evaluator().stats();
    assert_eq!(stats.decisions, 128);
    assert_eq!(stats.allowed, 64);
    assert_eq!(stats.denied, 64);
}

#[tokio::test]
async fn test_tag_policy_alone() {
    let harness = TestHarness::new().unwrap();
    harness.policies().delete("kv-policy").unwrap();
    let cred = harness.client_credential();

    let read = harness
        .evaluator()
        .authorize(&cred, "kv/data/foo", Operation::Read)
        .await
        .unwrap();
    assert!(read.allowed);

    // Without kv-policy nothing denies kv/internal/bad.
    let bad = harness
        .evaluator()
        .authorize(&cred, "kv/internal/bad", Operation::Read)
        .await
        .unwrap();
    assert!(bad.allowed);

    let sudo = harness
        .evaluator()
        .authorize(&cred, "kv/data/foo", Operation::Sudo)
        .await
        .unwrap();
    assert!(!sudo.allowed);
    assert_eq!(sudo.reason, DecisionReason::MissingCapability);
}
