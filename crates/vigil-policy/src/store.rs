//! In-memory policy store.
//!
//! Policies are held as `Arc<Policy>` behind a `RwLock`. Readers clone the
//! `Arc`s they need and release the lock, so a concurrent `put` never shows
//! a half-written policy: a reader sees either the old value or the new one.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::error::{PolicyError, PolicyResult};
use crate::rule::{Policy, Rule, validate_policy_name};

#[derive(Debug, Default)]
struct Inner {
    policies: HashMap<String, Arc<Policy>>,
    revision: u64,
}

/// Named policies, safe to share across threads.
#[derive(Debug, Default)]
pub struct PolicyStore {
    inner: RwLock<Inner>,
}

impl PolicyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rules` under `name`, replacing any existing rule set.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidName`] for a rejected name, or
    /// [`PolicyError::Internal`] if the lock is poisoned.
    pub fn put(&self, name: &str, rules: Vec<Rule>) -> PolicyResult<Arc<Policy>> {
        self.put_policy(Policy::new(name, rules)?)
    }

    /// Register a built policy, replacing any policy with the same name.
    ///
    /// The stored copy is stamped with the next store revision.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidName`] for a rejected name, or
    /// [`PolicyError::Internal`] if the lock is poisoned.
    pub fn put_policy(&self, policy: Policy) -> PolicyResult<Arc<Policy>> {
        validate_policy_name(policy.name())?;

        let mut inner = self
            .inner
            .write()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;

        inner.revision = inner.revision.saturating_add(1);
        let stored = Arc::new(policy.with_revision(inner.revision));
        let replaced = inner
            .policies
            .insert(stored.name().to_string(), Arc::clone(&stored))
            .is_some();

        info!(
            policy = %stored.name(),
            rules = stored.rules().len(),
            revision = stored.revision(),
            replaced,
            "Policy registered"
        );
        Ok(stored)
    }

    /// Fetch a policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotFound`] if no policy has this name.
    pub fn get(&self, name: &str) -> PolicyResult<Arc<Policy>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;

        inner
            .policies
            .get(name)
            .cloned()
            .ok_or_else(|| PolicyError::NotFound(name.to_string()))
    }

    /// Remove a policy. Removing an unknown name is a no-op.
    ///
    /// Returns `true` if a policy was removed.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Internal`] if the lock is poisoned.
    pub fn delete(&self, name: &str) -> PolicyResult<bool> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;

        let removed = inner.policies.remove(name).is_some();
        if removed {
            info!(policy = %name, "Policy deleted");
        }
        Ok(removed)
    }

    /// Registered policy names, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Internal`] if the lock is poisoned.
    pub fn list(&self) -> PolicyResult<Vec<String>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;

        let mut names: Vec<String> = inner.policies.keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Number of registered policies.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Internal`] if the lock is poisoned.
    pub fn len(&self) -> PolicyResult<usize> {
        self.inner
            .read()
            .map(|inner| inner.policies.len())
            .map_err(|e| PolicyError::Internal(e.to_string()))
    }

    /// Whether the store holds no policies.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Internal`] if the lock is poisoned.
    pub fn is_empty(&self) -> PolicyResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Resolve `names` to policies under a single read lock.
    ///
    /// Unknown names are skipped with a warning. Duplicate names resolve once.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Internal`] if the lock is poisoned.
    pub fn snapshot<S: AsRef<str>>(&self, names: &[S]) -> PolicyResult<Vec<Arc<Policy>>> {
        let inner = self
            .inner
            .read()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;

        let mut resolved: Vec<Arc<Policy>> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            match inner.policies.get(name) {
                Some(policy) => {
                    if !resolved.iter().any(|p| p.name() == name) {
                        resolved.push(Arc::clone(policy));
                    }
                },
                None => warn!(policy = %name, "Bound policy is not registered, skipping"),
            }
        }
        Ok(resolved)
    }
}
