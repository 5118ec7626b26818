//! Layer merging with per-field provenance.

use std::collections::HashMap;
use std::fmt;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// User configuration (`~/.vigil/config.toml`).
    User,
    /// A file named on the command line.
    File,
    /// Environment variable fallback.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user (~/.vigil/config.toml)"),
            Self::File => write!(f, "config file"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Which layer set each dotted field path.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Merge `overlay` into `base`, recording `layer` for every leaf it sets.
///
/// Tables merge recursively. Anything else, arrays included, replaces the
/// base value outright.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);
                match base_table.get_mut(key) {
                    Some(base_val) if overlay_val.is_table() => {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    },
                    _ => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        record_leaves(overlay_val, &path, layer, sources);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            record_leaves(overlay, prefix, layer, sources);
        },
    }
}

/// Record `layer` for every leaf under `val`.
pub fn record_leaves(val: &toml::Value, prefix: &str, layer: ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer);
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_merge_tables_and_track() {
        let mut base = parse("[engine]\ndeny_mode = \"absolute\"\nsudo_paths = [\"a\"]\n");
        let mut sources = FieldSources::new();
        record_leaves(&base, "", ConfigLayer::Defaults, &mut sources);

        let overlay = parse("[engine]\ndeny_mode = \"most_specific\"\n");
        deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::File, &mut sources);

        assert_eq!(base["engine"]["deny_mode"].as_str(), Some("most_specific"));
        assert_eq!(base["engine"]["sudo_paths"][0].as_str(), Some("a"));
        assert_eq!(sources["engine.deny_mode"], ConfigLayer::File);
        assert_eq!(sources["engine.sudo_paths"], ConfigLayer::Defaults);
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = parse("[engine]\nsudo_paths = [\"a\", \"b\"]\n");
        let overlay = parse("[engine]\nsudo_paths = [\"c\"]\n");
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::User, &mut sources);

        let paths = base["engine"]["sudo_paths"].as_array().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(sources["engine.sudo_paths"], ConfigLayer::User);
    }
}
