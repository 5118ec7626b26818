//! The access evaluator: bind the credential, resolve the path, decide.

use std::sync::Arc;

use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;
use vigil_auth::{Credential, IdentityBinder};
use vigil_core::Operation;
use vigil_policy::{CapabilityResolver, Decision, PolicyStore, ResolverConfig};

use crate::error::{AccessError, AccessResult};
use crate::stats::{EvaluatorStats, StatsSnapshot};

/// Everything a decision depends on. Build once, share through `Arc`.
#[derive(Debug)]
pub struct AccessContext {
    binder: Arc<IdentityBinder>,
    resolver: CapabilityResolver,
}

impl AccessContext {
    /// Assemble a context.
    #[must_use]
    pub fn new(
        policies: Arc<PolicyStore>,
        binder: Arc<IdentityBinder>,
        resolver_config: ResolverConfig,
    ) -> Self {
        Self {
            binder,
            resolver: CapabilityResolver::new(policies, resolver_config),
        }
    }

    /// Policy store, for administrative writes.
    #[must_use]
    pub fn policies(&self) -> &Arc<PolicyStore> {
        self.resolver.store()
    }

    /// Identity binder, for binding administration.
    #[must_use]
    pub fn binder(&self) -> &Arc<IdentityBinder> {
        &self.binder
    }

    /// Capability resolver.
    #[must_use]
    pub fn resolver(&self) -> &CapabilityResolver {
        &self.resolver
    }
}

/// Authorizes requests against an [`AccessContext`].
#[derive(Debug)]
pub struct AccessEvaluator {
    context: Arc<AccessContext>,
    stats: EvaluatorStats,
}

impl AccessEvaluator {
    /// Create an evaluator over `context`.
    #[must_use]
    pub fn new(context: Arc<AccessContext>) -> Self {
        Self {
            context,
            stats: EvaluatorStats::default(),
        }
    }

    /// The shared context.
    #[must_use]
    pub fn context(&self) -> &Arc<AccessContext> {
        &self.context
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Authorize `operation` on `path` for the holder of `credential`.
    ///
    /// A deny is returned as `Ok` with `allowed == false`. Authentication
    /// failures short-circuit before any policy is consulted. A certificate
    /// is authenticated without minting a token; callers that want one log
    /// in through [`IdentityBinder::bind`].
    ///
    /// # Errors
    ///
    /// [`AccessError::InvalidPath`] for a malformed path,
    /// [`AccessError::Auth`] if the credential does not bind, and
    /// [`AccessError::Policy`] if the policy store fails.
    pub async fn authorize(
        &self,
        credential: &Credential,
        path: &str,
        operation: Operation,
    ) -> AccessResult<Decision> {
        let span = info_span!(
            "authorize",
            request_id = %Uuid::new_v4(),
            credential = credential.kind(),
            path = %path,
            operation = %operation,
        );
        self.authorize_inner(credential, path, operation)
            .instrument(span)
            .await
    }

    /// Like [`Self::authorize`], parsing the operation name first.
    ///
    /// # Errors
    ///
    /// [`AccessError::InvalidOperation`] if `operation` is not a known
    /// operation; otherwise as [`Self::authorize`].
    pub async fn authorize_raw(
        &self,
        credential: &Credential,
        path: &str,
        operation: &str,
    ) -> AccessResult<Decision> {
        let operation: Operation = match operation.parse() {
            Ok(op) => op,
            Err(e) => {
                self.stats.record_rejected();
                warn!(operation = %operation, path = %path, "Rejected unknown operation");
                return Err(AccessError::InvalidOperation(e));
            },
        };
        self.authorize(credential, path, operation).await
    }

    async fn authorize_inner(
        &self,
        credential: &Credential,
        path: &str,
        operation: Operation,
    ) -> AccessResult<Decision> {
        if let Err(e) = validate_path(path) {
            self.stats.record_rejected();
            warn!(error = %e, "Rejected malformed path");
            return Err(e);
        }

        let identity = match self.context.binder.authenticate(credential).await {
            Ok(identity) => identity,
            Err(e) => {
                self.stats.record_auth_failure();
                return Err(AccessError::Auth(e));
            },
        };

        let decision = self
            .context
            .resolver
            .resolve(identity.policies(), path, operation)?;
        self.stats.record_decision(decision.allowed);

        debug!(
            subject = %identity.subject(),
            allowed = decision.allowed,
            reason = %decision.reason,
            "Access decision"
        );
        Ok(decision)
    }
}

fn validate_path(path: &str) -> AccessResult<()> {
    let reason = if path.trim_start_matches('/').is_empty() {
        "path is empty"
    } else if path.split('/').any(|seg| seg == "..") {
        "path contains a '..' segment"
    } else if path.chars().any(char::is_control) {
        "path contains control characters"
    } else {
        return Ok(());
    };

    Err(AccessError::InvalidPath {
        path: path.escape_debug().to_string(),
        reason,
    })
}
