//! Policy command: inspect configured policies.

use anyhow::Result;
use vigil_config::Config;
use vigil_policy::PolicyDocument;

use crate::config_bridge;
use crate::theme::Theme;

/// List configured policies.
pub(crate) fn list_policies(config: &Config) -> Result<()> {
    let store = config_bridge::to_policy_store(config)?;
    let names = store.list()?;

    if names.is_empty() {
        println!("{}", Theme::info("No policies configured"));
        return Ok(());
    }

    println!("{}", Theme::header("Policies"));
    for name in names {
        let policy = store.get(&name)?;
        let denies = policy.rules().iter().filter(|r| r.is_deny()).count();
        println!(
            "  {name}  {}",
            Theme::dimmed(&format!("{} rules, {denies} deny", policy.rules().len()))
        );
    }
    Ok(())
}

/// Print one policy as a TOML document.
pub(crate) fn show_policy(config: &Config, name: &str) -> Result<()> {
    let store = config_bridge::to_policy_store(config)?;
    let policy = store.get(name)?;
    print!("{}", PolicyDocument::from(policy.as_ref()).to_toml()?);
    Ok(())
}
