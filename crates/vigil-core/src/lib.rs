//! Vigil Core - the shared vocabulary of the Vigil access-control engine.
//!
//! This crate provides:
//! - [`Capability`] and [`Operation`], the permission kinds policies grant
//! - [`CapabilitySet`], a compact copyable set of capabilities
//! - Identifier and timestamp newtypes used across the workspace
//!
//! # Example
//!
//! ```
//! use vigil_core::{Capability, CapabilitySet, Operation};
//!
//! let set: CapabilitySet = [Capability::Read, Capability::List].into_iter().collect();
//! assert!(set.permits(Operation::Read));
//! assert!(!set.permits(Operation::Update));
//!
//! let op: Operation = "list".parse().unwrap();
//! assert_eq!(op, Operation::List);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod capability;
pub mod types;

pub use capability::{Capability, CapabilitySet, Operation, ParseCapabilityError};
pub use types::{Timestamp, TokenId};
