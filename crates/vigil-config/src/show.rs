//! Source-annotated display for `config show`.

use std::fmt::Write as _;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::FieldSources;
use crate::types::Config;

/// A resolved configuration together with source annotations.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path → which layer set the value.
    pub field_sources: FieldSources,
    /// Config file paths that were loaded, lowest precedence first.
    pub loaded_files: Vec<String>,
}

/// Output format for `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowFormat {
    /// TOML with a trailing comment naming each value's source.
    #[default]
    Toml,
    /// JSON, for programmatic consumption.
    Json,
}

impl ResolvedConfig {
    /// Render the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SerializeError`] if serialization fails.
    pub fn show(&self, format: ShowFormat) -> ConfigResult<String> {
        match format {
            ShowFormat::Toml => self.show_toml(),
            ShowFormat::Json => serde_json::to_string_pretty(&self.config)
                .map_err(|e| ConfigError::SerializeError(e.to_string())),
        }
    }

    fn show_toml(&self) -> ConfigResult<String> {
        let toml_str = toml::to_string_pretty(&self.config)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        let mut output = String::new();
        output.push_str("# Resolved Vigil configuration\n");
        output.push_str("# Source annotations: [defaults] [user] [config file] [env]\n");
        if !self.loaded_files.is_empty() {
            output.push_str("#\n# Loaded files (in precedence order):\n");
            for (i, path) in self.loaded_files.iter().enumerate() {
                let _ = writeln!(output, "#   {}. {path}", i.saturating_add(1));
            }
        }
        output.push('\n');

        let mut section = String::new();
        for line in toml_str.lines() {
            let trimmed = line.trim();
            if let Some(header) = trimmed.strip_prefix('[') {
                section = header.trim_matches(|c| c == '[' || c == ']').to_owned();
            }

            match self.annotate_line(trimmed, &section) {
                Some(annotation) => {
                    let _ = writeln!(output, "{line}  # {annotation}");
                },
                None => {
                    output.push_str(line);
                    output.push('\n');
                },
            }
        }

        Ok(output)
    }

    /// Source annotation for a `key = value` line in `section`.
    ///
    /// Array-of-tables entries (`policies`, `bindings`) are recorded as a
    /// whole, so their header line carries the annotation.
    fn annotate_line(&self, trimmed: &str, section: &str) -> Option<String> {
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let field_path = if trimmed.starts_with("[[") {
            section.split('.').next()?.to_owned()
        } else if trimmed.starts_with('[') {
            return None;
        } else {
            let key = trimmed.split('=').next()?.trim();
            if section.is_empty() {
                key.to_owned()
            } else {
                format!("{section}.{key}")
            }
        };

        self.field_sources
            .get(&field_path)
            .map(|layer| format!("[{layer}]"))
    }
}
