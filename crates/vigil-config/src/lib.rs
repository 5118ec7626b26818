//! Layered configuration for the Vigil access engine.
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Config file** passed with `--config`
//! 2. **User** (`~/.vigil/config.toml`)
//! 3. **Environment variables** (`VIGIL_*`), fallback only
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! This crate has no dependencies on other Vigil crates. The CLI converts
//! config values into engine types at startup.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// `VIGIL_*` environment variable fallbacks.
pub mod env;
/// Configuration errors.
pub mod error;
/// File discovery and layered loading.
pub mod loader;
/// Layer merging with provenance tracking.
pub mod merge;
/// Annotated rendering of a resolved configuration.
pub mod show;
/// Configuration types.
pub mod types;
/// Post-merge validation.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use merge::{ConfigLayer, FieldSources};
pub use show::{ResolvedConfig, ShowFormat};
pub use types::*;

impl Config {
    /// Load with the full precedence chain.
    ///
    /// # Errors
    ///
    /// See [`loader::load`].
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, None)
    }

    /// Load with an alternate `~/.vigil` directory.
    ///
    /// # Errors
    ///
    /// See [`loader::load`].
    pub fn load_with_home(
        explicit: Option<&std::path::Path>,
        home: &std::path::Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(explicit, Some(home))
    }

    /// Load a single file without layering.
    ///
    /// # Errors
    ///
    /// See [`loader::load_file`].
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }

    /// Validate this configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error found.
    pub fn validate(&self) -> ConfigResult<()> {
        validate::validate(self)
    }
}
