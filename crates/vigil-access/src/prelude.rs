//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_access::prelude::*;` to import all essential types.

pub use crate::{AccessContext, AccessError, AccessEvaluator, AccessResult, StatsSnapshot};
