//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_core::prelude::*;` to import all essential types.

pub use crate::{Capability, CapabilitySet, Operation, ParseCapabilityError};
pub use crate::{Timestamp, TokenId};
