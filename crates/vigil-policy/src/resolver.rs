//! Capability resolution: turn bound policy names, a path and an operation
//! into an allow/deny [`Decision`].
//!
//! Every rule whose pattern matches the path is a candidate. Candidates are
//! ranked by pattern specificity; on a tie a `deny` rule wins, and after that
//! the most recently registered rule wins. The top candidate decides, except
//! that in [`DenyMode::Absolute`] any matching `deny` rule denies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;
use vigil_core::{Capability, CapabilitySet, Operation};

use crate::error::PolicyResult;
use crate::pattern::{PathPattern, Specificity};
use crate::rule::{Policy, Rule};
use crate::store::PolicyStore;

/// How `deny` rules interact with more specific allow rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyMode {
    /// Any matching `deny` rule denies, whatever its specificity.
    #[default]
    Absolute,
    /// A `deny` rule only denies when it is the winning rule.
    MostSpecific,
}

impl DenyMode {
    /// Config name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::MostSpecific => "most_specific",
        }
    }
}

impl fmt::Display for DenyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DenyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "absolute" => Ok(Self::Absolute),
            "most_specific" => Ok(Self::MostSpecific),
            other => Err(format!(
                "unknown deny mode '{other}' (expected absolute or most_specific)"
            )),
        }
    }
}

/// Resolver settings.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Deny precedence.
    pub deny_mode: DenyMode,
    /// Paths that additionally require `sudo` in the winning rule.
    pub sudo_paths: Vec<PathPattern>,
}

impl ResolverConfig {
    /// Set the deny mode.
    #[must_use]
    pub fn with_deny_mode(mut self, deny_mode: DenyMode) -> Self {
        self.deny_mode = deny_mode;
        self
    }

    /// Add a sudo-protected pattern.
    #[must_use]
    pub fn with_sudo_path(mut self, pattern: impl Into<PathPattern>) -> Self {
        self.sudo_paths.push(pattern.into());
        self
    }

    /// Whether `path` is sudo-protected.
    #[must_use]
    pub fn requires_sudo(&self, path: &str) -> bool {
        self.sudo_paths.iter().any(|p| p.matches(path))
    }
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// The identity has no registered policies.
    NoPolicies,
    /// No rule in any bound policy matches the path.
    NoMatchingRule,
    /// A matching rule carries `deny`.
    ExplicitDeny,
    /// The winning rule grants the operation.
    Granted,
    /// The winning rule does not grant the operation.
    MissingCapability,
    /// The path is sudo-protected and the winning rule lacks `sudo`.
    SudoRequired,
}

impl DecisionReason {
    /// Short machine-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoPolicies => "no_policies",
            Self::NoMatchingRule => "no_matching_rule",
            Self::ExplicitDeny => "explicit_deny",
            Self::Granted => "granted",
            Self::MissingCapability => "missing_capability",
            Self::SudoRequired => "sudo_required",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule a decision rests on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRule {
    /// Owning policy.
    pub policy: String,
    /// Pattern text as written.
    pub pattern: String,
    /// Capabilities of the rule.
    pub capabilities: CapabilitySet,
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the operation is permitted.
    pub allowed: bool,
    /// Why.
    pub reason: DecisionReason,
    /// The deciding rule, if any matched.
    pub matched: Option<MatchedRule>,
}

impl Decision {
    fn deny(reason: DecisionReason, matched: Option<MatchedRule>) -> Self {
        Self {
            allowed: false,
            reason,
            matched,
        }
    }

    fn grant(matched: MatchedRule) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Granted,
            matched: Some(matched),
        }
    }

    /// Whether the operation is permitted.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        self.allowed
    }
}

struct Candidate<'a> {
    policy: &'a Policy,
    index: usize,
    rule: &'a Rule,
}

impl Candidate<'_> {
    fn rank(&self) -> (Specificity, bool, u64, usize) {
        (
            self.rule.pattern.specificity(),
            self.rule.is_deny(),
            self.policy.revision(),
            self.index,
        )
    }

    fn to_matched(&self) -> MatchedRule {
        MatchedRule {
            policy: self.policy.name().to_string(),
            pattern: self.rule.pattern.as_str().to_string(),
            capabilities: self.rule.capabilities,
        }
    }
}

/// Resolves decisions against a shared [`PolicyStore`].
#[derive(Debug, Clone)]
pub struct CapabilityResolver {
    store: Arc<PolicyStore>,
    config: ResolverConfig,
}

impl CapabilityResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(store: Arc<PolicyStore>, config: ResolverConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    /// Resolver settings.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Decide whether the holder of `policy_names` may perform `operation`
    /// on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PolicyError::Internal`] if the store lock is poisoned.
    pub fn resolve<S: AsRef<str>>(
        &self,
        policy_names: &[S],
        path: &str,
        operation: Operation,
    ) -> PolicyResult<Decision> {
        let policies = self.store.snapshot(policy_names)?;
        let decision = self.decide(&policies, path, operation);

        debug!(
            path = %path,
            operation = %operation,
            allowed = decision.allowed,
            reason = %decision.reason,
            policy = decision.matched.as_ref().map(|m| m.policy.as_str()),
            pattern = decision.matched.as_ref().map(|m| m.pattern.as_str()),
            "Resolved capability"
        );
        Ok(decision)
    }

    /// Decide against an already resolved policy list.
    #[must_use]
    pub fn decide(&self, policies: &[Arc<Policy>], path: &str, operation: Operation) -> Decision {
        if policies.is_empty() {
            return Decision::deny(DecisionReason::NoPolicies, None);
        }

        let candidates: Vec<Candidate<'_>> = policies
            .iter()
            .flat_map(|policy| {
                policy
                    .rules()
                    .iter()
                    .enumerate()
                    .filter(|(_, rule)| rule.pattern.matches(path))
                    .map(|(index, rule)| Candidate {
                        policy: policy.as_ref(),
                        index,
                        rule,
                    })
            })
            .collect();

        let Some(winner) = candidates.iter().max_by_key(|c| c.rank()) else {
            return Decision::deny(DecisionReason::NoMatchingRule, None);
        };

        let deciding_deny = match self.config.deny_mode {
            DenyMode::Absolute => candidates
                .iter()
                .filter(|c| c.rule.is_deny())
                .max_by_key(|c| c.rank()),
            DenyMode::MostSpecific => winner.rule.is_deny().then_some(winner),
        };
        if let Some(deny) = deciding_deny {
            return Decision::deny(DecisionReason::ExplicitDeny, Some(deny.to_matched()));
        }

        let caps = winner.rule.capabilities;
        if !caps.permits(operation) {
            return Decision::deny(DecisionReason::MissingCapability, Some(winner.to_matched()));
        }
        if self.config.requires_sudo(path) && !caps.contains(Capability::Sudo) {
            return Decision::deny(DecisionReason::SudoRequired, Some(winner.to_matched()));
        }

        Decision::grant(winner.to_matched())
    }
}
