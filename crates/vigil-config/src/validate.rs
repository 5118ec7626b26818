//! Post-merge configuration validation.
//!
//! Checks ranges and cross-field invariants on a deserialized
//! [`Config`](crate::Config). The first failure is returned.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Capability names a policy rule may grant.
const CAPABILITY_NAMES: &[&str] = &["create", "read", "update", "delete", "list", "sudo", "deny"];

/// Upper bound on clock skew tolerance (one hour).
const MAX_CLOCK_SKEW_SECS: u64 = 3600;

/// Upper bound on a single revocation check (one minute).
const MAX_REVOCATION_TIMEOUT_MS: u64 = 60_000;

/// Validate a fully merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_engine(config)?;
    validate_auth(config)?;
    validate_policies(config)?;
    validate_bindings(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn validate_engine(config: &Config) -> ConfigResult<()> {
    let e = &config.engine;

    if !matches!(
        e.deny_mode.as_str(),
        "absolute" | "most_specific" | "most-specific"
    ) {
        return Err(invalid(
            "engine.deny_mode",
            format!(
                "unknown deny mode '{}'; expected one of: absolute, most_specific",
                e.deny_mode
            ),
        ));
    }

    if e.sudo_paths.iter().any(|p| p.trim().is_empty()) {
        return Err(invalid("engine.sudo_paths", "sudo path patterns must not be empty"));
    }

    Ok(())
}

fn validate_auth(config: &Config) -> ConfigResult<()> {
    let a = &config.auth;

    for (i, key) in a.trusted_cas.iter().enumerate() {
        if !is_hex_of_len(key, 64) {
            return Err(invalid(
                format!("auth.trusted_cas[{i}]"),
                "expected a 32-byte public key as 64 hex characters",
            ));
        }
    }

    if a.clock_skew_secs > MAX_CLOCK_SKEW_SECS {
        return Err(invalid(
            "auth.clock_skew_secs",
            format!(
                "{} exceeds the {MAX_CLOCK_SKEW_SECS} second limit",
                a.clock_skew_secs
            ),
        ));
    }

    if a.revocation_timeout_ms == 0 || a.revocation_timeout_ms > MAX_REVOCATION_TIMEOUT_MS {
        return Err(invalid(
            "auth.revocation_timeout_ms",
            format!(
                "{} is out of range; must be between 1 and {MAX_REVOCATION_TIMEOUT_MS}",
                a.revocation_timeout_ms
            ),
        ));
    }

    Ok(())
}

fn validate_policies(config: &Config) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for (i, policy) in config.policies.iter().enumerate() {
        let field = format!("policies[{i}].name");
        if policy.name.is_empty()
            || policy.name.contains('/')
            || policy.name.chars().any(char::is_whitespace)
        {
            return Err(invalid(
                field,
                format!(
                    "invalid policy name '{}'; names are non-empty without whitespace or '/'",
                    policy.name
                ),
            ));
        }
        if !seen.insert(policy.name.as_str()) {
            return Err(invalid(
                field,
                format!("duplicate policy name '{}'", policy.name),
            ));
        }

        for (j, rule) in policy.paths.iter().enumerate() {
            if let Some(unknown) = rule
                .capabilities
                .iter()
                .find(|c| !CAPABILITY_NAMES.contains(&c.as_str()))
            {
                return Err(invalid(
                    format!("policies[{i}].path[{j}].capabilities"),
                    format!("unknown capability '{unknown}'"),
                ));
            }
        }
    }

    Ok(())
}

fn validate_bindings(config: &Config) -> ConfigResult<()> {
    for (i, binding) in config.bindings.iter().enumerate() {
        if binding.name.trim().is_empty() {
            return Err(invalid(format!("bindings[{i}].name"), "binding name is empty"));
        }

        match (&binding.issuer, &binding.certificate) {
            (Some(issuer), None) => {
                if !is_hex_of_len(issuer, 16) {
                    return Err(invalid(
                        format!("bindings[{i}].issuer"),
                        "expected a CA key id as 16 hex characters",
                    ));
                }
            },
            (None, Some(cert)) => {
                if !is_hex_of_len(cert, 64) {
                    return Err(invalid(
                        format!("bindings[{i}].certificate"),
                        "expected a certificate fingerprint as 64 hex characters",
                    ));
                }
            },
            _ => {
                return Err(invalid(
                    format!("bindings[{i}]"),
                    "exactly one of 'issuer' and 'certificate' must be set",
                ));
            },
        }
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(l.level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        ));
    }

    if !matches!(l.format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        ));
    }

    match l.target.as_str() {
        "stdout" | "stderr" => {},
        "file" => {
            if l.directory.as_deref().is_none_or(str::is_empty) {
                return Err(invalid(
                    "logging.directory",
                    "a directory is required when target is 'file'",
                ));
            }
        },
        other => {
            return Err(invalid(
                "logging.target",
                format!("unknown target '{other}'; expected one of: stdout, stderr, file"),
            ));
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BindingSection, PathSection, PolicySection};

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_engine_checks() {
        let mut config = Config::default();
        config.engine.deny_mode = "most-specific".to_owned();
        assert!(validate(&config).is_ok());

        config.engine.deny_mode = "lenient".to_owned();
        assert_eq!(field_of(validate(&config)), "engine.deny_mode");

        let mut config = Config::default();
        config.engine.sudo_paths.push(String::new());
        assert_eq!(field_of(validate(&config)), "engine.sudo_paths");
    }

    #[test]
    fn test_auth_ranges() {
        let mut config = Config::default();
        config.auth.trusted_cas.push("abcd".to_owned());
        assert_eq!(field_of(validate(&config)), "auth.trusted_cas[0]");

        let mut config = Config::default();
        config.auth.clock_skew_secs = 3601;
        assert_eq!(field_of(validate(&config)), "auth.clock_skew_secs");

        let mut config = Config::default();
        config.auth.revocation_timeout_ms = 0;
        assert_eq!(field_of(validate(&config)), "auth.revocation_timeout_ms");
    }

    #[test]
    fn test_policy_checks() {
        let policy = |name: &str, caps: &[&str]| PolicySection {
            name: name.to_owned(),
            paths: vec![PathSection {
                pattern: "kv/*".to_owned(),
                capabilities: caps.iter().map(|c| (*c).to_owned()).collect(),
            }],
        };

        let mut config = Config::default();
        config.policies = vec![policy("kv-policy", &["read", "deny"])];
        assert!(validate(&config).is_ok());

        config.policies.push(policy("kv-policy", &["read"]));
        assert_eq!(field_of(validate(&config)), "policies[1].name");

        config.policies = vec![policy("bad name", &["read"])];
        assert_eq!(field_of(validate(&config)), "policies[0].name");

        config.policies = vec![policy("kv-policy", &["write"])];
        assert_eq!(field_of(validate(&config)), "policies[0].path[0].capabilities");
    }

    #[test]
    fn test_binding_needs_exactly_one_target() {
        let mut config = Config::default();
        config.bindings = vec![BindingSection {
            name: "test".to_owned(),
            ..BindingSection::default()
        }];
        assert_eq!(field_of(validate(&config)), "bindings[0]");

        config.bindings[0].issuer = Some("0011223344556677".to_owned());
        assert!(validate(&config).is_ok());

        config.bindings[0].certificate = Some("00".repeat(32));
        assert_eq!(field_of(validate(&config)), "bindings[0]");

        config.bindings[0].issuer = None;
        assert!(validate(&config).is_ok());

        config.bindings[0].certificate = Some("zz".to_owned());
        assert_eq!(field_of(validate(&config)), "bindings[0].certificate");
    }

    #[test]
    fn test_logging_checks() {
        let mut config = Config::default();
        config.logging.target = "file".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.directory");

        config.logging.directory = Some("/var/log/vigil".to_owned());
        assert!(validate(&config).is_ok());

        config.logging.format = "xml".to_owned();
        assert_eq!(field_of(validate(&config)), "logging.format");
    }
}
