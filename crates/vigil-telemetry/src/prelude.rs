//! Common imports for logging setup.
//!
//! ```rust
//! use vigil_telemetry::prelude::*;
//! ```

pub use crate::{LogConfig, LogFormat, LogTarget, TelemetryError, TelemetryResult, setup_logging};
