//! Policy fixtures.
//!
//! `kv_policy` and `tag_policy` are the two rule sets the reference
//! deployment binds to its test client.

use std::sync::Arc;

use vigil_core::Capability;
use vigil_policy::{Policy, PolicyBuilder, PolicyResult, PolicyStore};

/// Common name of the default test client.
pub const TEST_CLIENT: &str = "test1";

/// Create, read, update, delete and list.
pub const CRUDL: [Capability; 5] = [
    Capability::Create,
    Capability::Read,
    Capability::Update,
    Capability::Delete,
    Capability::List,
];

/// [`CRUDL`] plus sudo.
pub const CRUDL_SUDO: [Capability; 6] = [
    Capability::Create,
    Capability::Read,
    Capability::Update,
    Capability::Delete,
    Capability::List,
    Capability::Sudo,
];

/// Broad KV access with one carved-out deny.
///
/// # Errors
///
/// Never in practice; the rule set is static.
pub fn kv_policy() -> PolicyResult<Policy> {
    PolicyBuilder::new("kv-policy")
        .path("auth/token/create")
        .capabilities(CRUDL_SUDO)
        .path("*")
        .capabilities(CRUDL_SUDO)
        .path("kv/*")
        .capabilities(CRUDL_SUDO)
        .path("kv/data/*")
        .capabilities(CRUDL_SUDO)
        .path("kv/metadata/external/*")
        .capabilities(CRUDL_SUDO)
        .path("kv/metadata/internal/*")
        .capabilities(CRUDL_SUDO)
        .path("kv/internal/bad")
        .deny()
        .path("sys/tools/random")
        .capabilities(CRUDL)
        .path("sys/tools/random/*")
        .capabilities(CRUDL)
        .path("/auth/token/lookup-self")
        .capabilities(CRUDL)
        .path("/auth/token/renew-self")
        .capabilities(CRUDL)
        .path("/transit/")
        .capabilities(CRUDL)
        .build()
}

/// Token creation plus CRUDL on the KV mount.
///
/// # Errors
///
/// Never in practice; the rule set is static.
pub fn tag_policy() -> PolicyResult<Policy> {
    PolicyBuilder::new("tag-policy")
        .path("auth/token/create")
        .capabilities(CRUDL_SUDO)
        .path("kv/*")
        .capabilities(CRUDL)
        .path("sys/tools/random")
        .capabilities(CRUDL)
        .path("sys/tools/random/*")
        .capabilities(CRUDL)
        .path("/auth/token/lookup-self")
        .capabilities(CRUDL)
        .path("/auth/token/renew-self")
        .capabilities(CRUDL)
        .build()
}

/// A store holding `kv-policy` and `tag-policy`.
///
/// # Errors
///
/// Returns an error if the store rejects a write.
pub fn test_policy_store() -> PolicyResult<Arc<PolicyStore>> {
    let store = Arc::new(PolicyStore::new());
    store.put_policy(kv_policy()?)?;
    store.put_policy(tag_policy()?)?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_policies_build() {
        assert_eq!(kv_policy().unwrap().rules().len(), 12);
        assert_eq!(tag_policy().unwrap().rules().len(), 6);

        let store = test_policy_store().unwrap();
        assert_eq!(store.list().unwrap(), vec!["kv-policy", "tag-policy"]);
    }

    #[test]
    fn test_kv_policy_has_one_deny() {
        let policy = kv_policy().unwrap();
        let denies: Vec<_> = policy.rules().iter().filter(|r| r.is_deny()).collect();
        assert_eq!(denies.len(), 1);
        assert_eq!(denies[0].pattern.as_str(), "kv/internal/bad");
    }
}
