//! Environment variable fallbacks.
//!
//! Env vars are a fallback, not an override: one is applied only when no
//! config file set the field it maps to.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: ValueKind,
}

#[derive(Clone, Copy)]
enum ValueKind {
    Text,
    Integer,
}

/// All supported `VIGIL_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "VIGIL_LOG_LEVEL",
        field_path: "logging.level",
        kind: ValueKind::Text,
    },
    EnvMapping {
        var_name: "VIGIL_LOG_FORMAT",
        field_path: "logging.format",
        kind: ValueKind::Text,
    },
    EnvMapping {
        var_name: "VIGIL_DENY_MODE",
        field_path: "engine.deny_mode",
        kind: ValueKind::Text,
    },
    EnvMapping {
        var_name: "VIGIL_REVOCATION_TIMEOUT_MS",
        field_path: "auth.revocation_timeout_ms",
        kind: ValueKind::Integer,
    },
    EnvMapping {
        var_name: "VIGIL_CLOCK_SKEW_SECS",
        field_path: "auth.clock_skew_secs",
        kind: ValueKind::Integer,
    },
];

/// Snapshot the process environment, keeping only `VIGIL_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("VIGIL_"))
        .collect()
}

/// Apply env var fallbacks to fields no config file set.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a numeric variable does not parse.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = match mapping.kind {
            ValueKind::Text => toml::Value::String(raw.clone()),
            ValueKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(toml::Value::Integer)
                .map_err(|e| ConfigError::EnvError {
                    var_name: mapping.var_name.to_owned(),
                    message: format!("expected an integer: {e}"),
                })?,
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}
