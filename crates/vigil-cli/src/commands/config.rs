//! Config command: show, validate and locate configuration.

use std::path::Path;

use anyhow::{Result, bail};
use vigil_config::{ResolvedConfig, ShowFormat};

use crate::config_bridge;
use crate::theme::Theme;

/// Print the resolved configuration.
pub(crate) fn show_config(resolved: &ResolvedConfig, format: &str) -> Result<()> {
    let format = match format {
        "toml" => ShowFormat::Toml,
        "json" => ShowFormat::Json,
        other => bail!("unknown format '{other}'; expected toml or json"),
    };

    print!("{}", resolved.show(format)?);
    Ok(())
}

/// Load, validate and convert the configuration.
pub(crate) fn validate_config(resolved: &ResolvedConfig) -> Result<()> {
    config_bridge::to_evaluator(&resolved.config)?;

    println!("{}", Theme::success("Configuration is valid"));
    for path in &resolved.loaded_files {
        println!("  {}", Theme::dimmed(path));
    }
    println!(
        "  {} policies, {} bindings, {} trusted CAs",
        resolved.config.policies.len(),
        resolved.config.bindings.len(),
        resolved.config.auth.trusted_cas.len()
    );
    Ok(())
}

/// List the files consulted, in precedence order.
pub(crate) fn show_paths(explicit: Option<&Path>) {
    println!("{}", Theme::header("Config files (lowest precedence first)"));
    println!("  {}", Theme::dimmed("<embedded defaults>"));
    println!("  ~/.vigil/config.toml");
    if let Some(path) = explicit {
        println!("  {}", path.display());
    }
    println!(
        "  {}",
        Theme::dimmed("VIGIL_* environment variables fill fields no file sets")
    );
}
