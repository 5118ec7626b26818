//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_policy::prelude::*;` to import all essential types.

pub use crate::{PolicyError, PolicyResult};

pub use crate::{PathPattern, Policy, PolicyBuilder, PolicyDocument, PolicyStore, Rule};

pub use crate::{CapabilityResolver, Decision, DecisionReason, DenyMode, ResolverConfig};
