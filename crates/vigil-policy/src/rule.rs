//! Policies, rules, and the ways to build them.
//!
//! A [`Policy`] is a named, ordered list of [`Rule`]s. Policies are built in
//! code with [`PolicyBuilder`] or parsed from a [`PolicyDocument`]:
//!
//! ```toml
//! name = "kv-policy"
//!
//! [[path]]
//! pattern = "kv/data/*"
//! capabilities = ["create", "read", "update", "delete", "list"]
//!
//! [[path]]
//! pattern = "kv/internal/bad"
//! capabilities = ["deny"]
//! ```

use serde::{Deserialize, Serialize};
use vigil_core::{Capability, CapabilitySet};

use crate::error::{PolicyError, PolicyResult};
use crate::pattern::PathPattern;

/// Check a policy name: non-empty, no whitespace, no `/`.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidName`] describing the first problem found.
pub fn validate_policy_name(name: &str) -> PolicyResult<()> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.chars().any(char::is_whitespace) {
        "name contains whitespace"
    } else if name.contains('/') {
        "name contains '/'"
    } else {
        return Ok(());
    };

    Err(PolicyError::InvalidName {
        name: name.to_string(),
        reason,
    })
}

/// A single rule: a path pattern and the capabilities it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Path pattern the rule applies to.
    pub pattern: PathPattern,
    /// Capabilities granted on matching paths.
    pub capabilities: CapabilitySet,
}

impl Rule {
    /// Create a rule.
    #[must_use]
    pub fn new(pattern: impl Into<PathPattern>, capabilities: impl Into<CapabilitySet>) -> Self {
        Self {
            pattern: pattern.into(),
            capabilities: capabilities.into(),
        }
    }

    /// A rule that denies everything on `pattern`.
    #[must_use]
    pub fn deny(pattern: impl Into<PathPattern>) -> Self {
        Self::new(pattern, CapabilitySet::deny())
    }

    /// Whether this rule carries `deny`.
    #[must_use]
    pub const fn is_deny(&self) -> bool {
        self.capabilities.is_deny()
    }
}

/// A named set of rules.
///
/// The revision is assigned by the store when the policy is registered and
/// orders rules of equal specificity across policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    name: String,
    rules: Vec<Rule>,
    revision: u64,
}

impl Policy {
    /// Create a policy with a checked name.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidName`] if the name is rejected.
    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> PolicyResult<Self> {
        let name = name.into();
        validate_policy_name(&name)?;
        Ok(Self {
            name,
            rules,
            revision: 0,
        })
    }

    /// Policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Store revision at which this policy was registered (0 if never stored).
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }
}

/// Fluent builder for [`Policy`].
///
/// ```
/// use vigil_core::Capability;
/// use vigil_policy::PolicyBuilder;
///
/// let policy = PolicyBuilder::new("kv-policy")
///     .path("kv/data/*")
///     .capabilities([Capability::Read, Capability::List])
///     .path("kv/internal/bad")
///     .deny()
///     .build()
///     .unwrap();
///
/// assert_eq!(policy.rules().len(), 2);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct PolicyBuilder {
    name: String,
    rules: Vec<Rule>,
}

impl PolicyBuilder {
    /// Start a policy called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Begin a rule on `pattern`; finish it with
    /// [`PathRuleBuilder::capabilities`] or [`PathRuleBuilder::deny`].
    pub fn path(self, pattern: impl Into<PathPattern>) -> PathRuleBuilder {
        PathRuleBuilder {
            parent: self,
            pattern: pattern.into(),
        }
    }

    /// Append a finished rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Build the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidName`] if the name is rejected.
    pub fn build(self) -> PolicyResult<Policy> {
        Policy::new(self.name, self.rules)
    }
}

/// A rule under construction; see [`PolicyBuilder::path`].
#[derive(Debug, Clone)]
#[must_use]
pub struct PathRuleBuilder {
    parent: PolicyBuilder,
    pattern: PathPattern,
}

impl PathRuleBuilder {
    /// Grant `caps` on the pending pattern.
    pub fn capabilities(self, caps: impl IntoIterator<Item = Capability>) -> PolicyBuilder {
        let set: CapabilitySet = caps.into_iter().collect();
        self.parent.rule(Rule::new(self.pattern, set))
    }

    /// Deny everything on the pending pattern.
    pub fn deny(self) -> PolicyBuilder {
        self.parent.rule(Rule::deny(self.pattern))
    }
}

/// One `[[path]]` table of a policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDocument {
    /// Path pattern.
    pub pattern: String,
    /// Capability names.
    #[serde(default)]
    pub capabilities: CapabilitySet,
}

/// Serializable form of a policy (TOML or JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Policy name.
    pub name: String,
    /// Rules, in order.
    #[serde(default, rename = "path")]
    pub paths: Vec<PathDocument>,
}

impl PolicyDocument {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidDocument`] if the TOML is malformed or
    /// names an unknown capability.
    pub fn from_toml(text: &str) -> PolicyResult<Self> {
        toml::from_str(text).map_err(|e| PolicyError::InvalidDocument(e.to_string()))
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidDocument`] if the JSON is malformed.
    pub fn from_json(text: &str) -> PolicyResult<Self> {
        serde_json::from_str(text).map_err(|e| PolicyError::InvalidDocument(e.to_string()))
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidDocument`] if serialization fails.
    pub fn to_toml(&self) -> PolicyResult<String> {
        toml::to_string_pretty(self).map_err(|e| PolicyError::InvalidDocument(e.to_string()))
    }

    /// Convert into a policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidName`] if the name is rejected.
    pub fn into_policy(self) -> PolicyResult<Policy> {
        let rules = self
            .paths
            .into_iter()
            .map(|p| Rule::new(p.pattern, p.capabilities))
            .collect();
        Policy::new(self.name, rules)
    }
}

impl From<&Policy> for PolicyDocument {
    fn from(policy: &Policy) -> Self {
        Self {
            name: policy.name.clone(),
            paths: policy
                .rules
                .iter()
                .map(|r| PathDocument {
                    pattern: r.pattern.as_str().to_string(),
                    capabilities: r.capabilities,
                })
                .collect(),
        }
    }
}
