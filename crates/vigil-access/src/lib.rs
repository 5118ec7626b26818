//! Vigil Access - the request-time entry point.
//!
//! [`AccessEvaluator::authorize`] binds a credential to an identity, resolves
//! the identity's policies against the request path, and returns the
//! [`Decision`](vigil_policy::Decision). Authentication failures never reach
//! the resolver.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vigil_access::{AccessContext, AccessEvaluator};
//! use vigil_auth::{BinderConfig, IdentityBinder};
//! use vigil_crypto::TrustAnchor;
//! use vigil_policy::{PolicyStore, ResolverConfig};
//!
//! let context = AccessContext::new(
//!     Arc::new(PolicyStore::new()),
//!     Arc::new(IdentityBinder::new(BinderConfig::new(TrustAnchor::new()))),
//!     ResolverConfig::default(),
//! );
//! let evaluator = AccessEvaluator::new(Arc::new(context));
//! assert_eq!(evaluator.stats().decisions, 0);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod evaluator;
mod stats;

pub use error::{AccessError, AccessResult};
pub use evaluator::{AccessContext, AccessEvaluator};
pub use stats::{EvaluatorStats, StatsSnapshot};
