//! Configuration types.
//!
//! These mirror the engine's domain types as plain strings and numbers so the
//! crate stays free of internal dependencies. The CLI converts them at
//! startup. Every section implements [`Default`], so a bare `[section]`
//! header yields a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Decision engine settings.
    pub engine: EngineSection,
    /// Certificate authentication settings.
    pub auth: AuthSection,
    /// Policy documents installed at startup.
    pub policies: Vec<PolicySection>,
    /// Credential bindings installed at startup.
    pub bindings: Vec<BindingSection>,
    /// Log level, format and destination.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// EngineSection
// ---------------------------------------------------------------------------

/// Decision engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// `"absolute"` (any matching deny denies) or `"most_specific"`.
    pub deny_mode: String,
    /// Path patterns whose winning rule must also carry `sudo`.
    pub sudo_paths: Vec<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            deny_mode: "absolute".to_owned(),
            sudo_paths: vec!["auth/token/create".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// AuthSection
// ---------------------------------------------------------------------------

/// Certificate authentication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Trusted CA public keys, hex-encoded (64 characters each).
    pub trusted_cas: Vec<String>,
    /// Tolerance on certificate validity windows, in seconds.
    pub clock_skew_secs: u64,
    /// Bound on each revocation check, in milliseconds.
    pub revocation_timeout_ms: u64,
    /// Certificate serials to reject.
    pub revoked_serials: Vec<u64>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            trusted_cas: Vec::new(),
            clock_skew_secs: 30,
            revocation_timeout_ms: 2000,
            revoked_serials: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// A policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySection {
    /// Unique policy name.
    pub name: String,
    /// Rules, in order.
    #[serde(default, rename = "path")]
    pub paths: Vec<PathSection>,
}

/// One rule of a policy document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSection {
    /// Path pattern.
    pub pattern: String,
    /// Capability names.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// A credential binding. Exactly one of `issuer` and `certificate` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingSection {
    /// Binding (role) name.
    pub name: String,
    /// CA key id (16 hex characters); binds every certificate it signs.
    pub issuer: Option<String>,
    /// Certificate fingerprint (64 hex characters).
    pub certificate: Option<String>,
    /// Granted policy names.
    pub policies: Vec<String>,
    /// Token period in seconds; 0 means tokens never expire.
    pub token_period_secs: u64,
    /// Glob patterns restricting the certificate common name.
    pub allowed_common_names: Vec<String>,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default level: trace, debug, info, warn, error.
    pub level: String,
    /// Output format: pretty, compact, json, full.
    pub format: String,
    /// Destination: stdout, stderr, file.
    pub target: String,
    /// Directory for file output.
    pub directory: Option<String>,
    /// Extra filter directives, e.g. `vigil_policy=debug`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            target: "stderr".to_owned(),
            directory: None,
            directives: Vec::new(),
        }
    }
}
