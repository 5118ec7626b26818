//! Vigil Policy - path-scoped policies and capability resolution.
//!
//! This crate provides:
//! - [`PathPattern`]: anchored, segment-aware glob patterns with a total
//!   specificity order
//! - [`Policy`], [`Rule`], [`PolicyBuilder`] and [`PolicyDocument`]
//! - [`PolicyStore`]: a concurrent, copy-on-write registry of named policies
//! - [`CapabilityResolver`]: ranks matching rules and produces a [`Decision`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vigil_core::{Capability, Operation};
//! use vigil_policy::{CapabilityResolver, PolicyBuilder, PolicyStore, ResolverConfig};
//!
//! let store = Arc::new(PolicyStore::new());
//! store
//!     .put_policy(
//!         PolicyBuilder::new("kv-policy")
//!             .path("kv/data/*")
//!             .capabilities([Capability::Read])
//!             .path("kv/internal/bad")
//!             .deny()
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let resolver = CapabilityResolver::new(store, ResolverConfig::default());
//! let decision = resolver.resolve(&["kv-policy"], "kv/data/foo", Operation::Read).unwrap();
//! assert!(decision.allowed);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod pattern;
mod resolver;
mod rule;
mod store;

pub use error::{PolicyError, PolicyResult};
pub use pattern::{PathPattern, Specificity, matches, specificity};
pub use resolver::{
    CapabilityResolver, Decision, DecisionReason, DenyMode, MatchedRule, ResolverConfig,
};
pub use rule::{
    PathDocument, PathRuleBuilder, Policy, PolicyBuilder, PolicyDocument, Rule,
    validate_policy_name,
};
pub use store::PolicyStore;
