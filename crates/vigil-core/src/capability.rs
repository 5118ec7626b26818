//! Capabilities, operations, and capability sets.
//!
//! A policy rule grants a [`CapabilitySet`] on a path pattern. A request asks
//! for exactly one [`Operation`]. `deny` is a capability but never an
//! operation: it only appears in rules, where it overrides everything else.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a capability or operation name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseCapabilityError {
    /// What was being parsed ("capability" or "operation").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// A permission kind that a policy rule may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Create new data at a path.
    Create,
    /// Read data at a path.
    Read,
    /// Change existing data at a path.
    Update,
    /// Delete data at a path.
    Delete,
    /// List keys below a path.
    List,
    /// Access root-protected paths.
    Sudo,
    /// Explicitly forbid all access. Overrides every other capability.
    Deny,
}

impl Capability {
    /// Every capability, in canonical order.
    pub const ALL: [Self; 7] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::List,
        Self::Sudo,
        Self::Deny,
    ];

    /// The lowercase name used in policy documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Sudo => "sudo",
            Self::Deny => "deny",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Create => 0b000_0001,
            Self::Read => 0b000_0010,
            Self::Update => 0b000_0100,
            Self::Delete => 0b000_1000,
            Self::List => 0b001_0000,
            Self::Sudo => 0b010_0000,
            Self::Deny => 0b100_0000,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| ParseCapabilityError {
                kind: "capability",
                value: s.to_string(),
            })
    }
}

/// An operation a caller requests on a path.
///
/// Operations mirror the non-deny capabilities one to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Create new data.
    Create,
    /// Read data.
    Read,
    /// Update existing data.
    Update,
    /// Delete data.
    Delete,
    /// List keys.
    List,
    /// Invoke a root-protected endpoint.
    Sudo,
}

impl Operation {
    /// Every operation, in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Create,
        Self::Read,
        Self::Update,
        Self::Delete,
        Self::List,
        Self::Sudo,
    ];

    /// The capability a rule must carry to permit this operation.
    #[must_use]
    pub const fn capability(self) -> Capability {
        match self {
            Self::Create => Capability::Create,
            Self::Read => Capability::Read,
            Self::Update => Capability::Update,
            Self::Delete => Capability::Delete,
            Self::List => Capability::List,
            Self::Sudo => Capability::Sudo,
        }
    }

    /// The lowercase operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.capability().as_str()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ParseCapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ParseCapabilityError {
                kind: "operation",
                value: s.to_string(),
            })
    }
}

impl From<Operation> for Capability {
    fn from(op: Operation) -> Self {
        op.capability()
    }
}

/// A set of capabilities, stored as a bitmask.
///
/// Serializes as a list of lowercase capability names in canonical order,
/// so `["read", "create"]` round-trips as `["create", "read"]`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A set holding only `deny`.
    #[must_use]
    pub const fn deny() -> Self {
        Self(Capability::Deny.bit())
    }

    /// Whether the set contains a capability.
    #[must_use]
    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }

    /// Add a capability.
    pub fn insert(&mut self, cap: Capability) {
        self.0 |= cap.bit();
    }

    /// Remove a capability.
    pub fn remove(&mut self, cap: Capability) {
        self.0 &= !cap.bit();
    }

    /// Return a copy with `cap` added.
    #[must_use]
    pub const fn with(self, cap: Capability) -> Self {
        Self(self.0 | cap.bit())
    }

    /// Whether the set carries `deny`.
    #[must_use]
    pub const fn is_deny(self) -> bool {
        self.contains(Capability::Deny)
    }

    /// Whether the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of capabilities in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether this set permits `op` on its own.
    ///
    /// A set containing `deny` permits nothing.
    #[must_use]
    pub const fn permits(self, op: Operation) -> bool {
        !self.is_deny() && self.contains(op.capability())
    }

    /// Iterate the capabilities in canonical order.
    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |cap| self.contains(*cap))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(caps: [Capability; N]) -> Self {
        caps.into_iter().collect()
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, cap) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(cap.as_str())?;
        }
        f.write_str("]")
    }
}

impl Serialize for CapabilitySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for CapabilitySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let caps = Vec::<Capability>::deserialize(deserializer)?;
        Ok(caps.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_parse() {
        assert_eq!("sudo".parse::<Capability>().unwrap(), Capability::Sudo);
        assert_eq!("deny".parse::<Capability>().unwrap(), Capability::Deny);
        assert!("Read".parse::<Capability>().is_err());
        assert!("write".parse::<Capability>().is_err());
    }

    #[test]
    fn test_operation_rejects_deny() {
        let err = "deny".parse::<Operation>().unwrap_err();
        assert_eq!(err.kind, "operation");
        assert_eq!(err.to_string(), "unknown operation 'deny'");
        assert_eq!("update".parse::<Operation>().unwrap(), Operation::Update);
    }

    #[test]
    fn test_set_membership() {
        let mut set = CapabilitySet::from([Capability::Read, Capability::List]);
        assert!(set.contains(Capability::Read));
        assert!(!set.contains(Capability::Create));
        assert_eq!(set.len(), 2);

        set.insert(Capability::Create);
        set.remove(Capability::List);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Capability::Create, Capability::Read]
        );
    }

    #[test]
    fn test_deny_permits_nothing() {
        let set = CapabilitySet::from([Capability::Read, Capability::Deny]);
        assert!(set.is_deny());
        for op in Operation::ALL {
            assert!(!set.permits(op));
        }
    }

    #[test]
    fn test_empty_set() {
        let set = CapabilitySet::empty();
        assert!(set.is_empty());
        assert!(!set.permits(Operation::Read));
        assert_eq!(set.to_string(), "[]");
    }

    #[test]
    fn test_set_display() {
        let set = CapabilitySet::from([Capability::List, Capability::Create]);
        assert_eq!(set.to_string(), "[create, list]");
    }

    #[test]
    fn test_set_serde_canonical_order() {
        let set: CapabilitySet = serde_json::from_str(r#"["read", "create", "read"]"#).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["create","read"]"#);
    }

    #[test]
    fn test_set_rejects_unknown_capability() {
        let result: Result<CapabilitySet, _> = serde_json::from_str(r#"["read", "write"]"#);
        assert!(result.is_err());
    }
}
