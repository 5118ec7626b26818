//! Bridge from `vigil_config::Config` to engine types.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use vigil_access::{AccessContext, AccessEvaluator};
use vigil_auth::{
    BinderConfig, CertBinding, CertificateId, IdentityBinder, SerialRevocationList, parse_key_id,
};
use vigil_config::{BindingSection, Config, PolicySection};
use vigil_core::{Capability, CapabilitySet};
use vigil_crypto::{PublicKey, TrustAnchor};
use vigil_policy::{DenyMode, PathPattern, Policy, PolicyStore, ResolverConfig, Rule};
use vigil_telemetry::{LogConfig, LogFormat, LogTarget};

/// Convert config to a [`LogConfig`].
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let format = match cfg.logging.format.as_str() {
        "pretty" => LogFormat::Pretty,
        "json" => LogFormat::Json,
        "full" => LogFormat::Full,
        _ => LogFormat::Compact,
    };

    let target = match (cfg.logging.target.as_str(), &cfg.logging.directory) {
        ("file", Some(dir)) => LogTarget::File(PathBuf::from(dir)),
        ("stdout", _) => LogTarget::Stdout,
        _ => LogTarget::Stderr,
    };

    let mut log_config = LogConfig::new(&cfg.logging.level)
        .with_format(format)
        .with_target(target);
    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }
    log_config
}

/// Convert config to a [`ResolverConfig`].
///
/// # Errors
///
/// Returns an error for an unknown deny mode.
pub fn to_resolver_config(cfg: &Config) -> Result<ResolverConfig> {
    let deny_mode: DenyMode = cfg
        .engine
        .deny_mode
        .parse()
        .map_err(anyhow::Error::msg)
        .context("engine.deny_mode")?;

    Ok(ResolverConfig {
        deny_mode,
        sudo_paths: cfg
            .engine
            .sudo_paths
            .iter()
            .map(|p| PathPattern::new(p.as_str()))
            .collect(),
    })
}

/// Convert config to a [`BinderConfig`].
///
/// # Errors
///
/// Returns an error if a trusted CA key is malformed.
pub fn to_binder_config(cfg: &Config) -> Result<BinderConfig> {
    let keys = cfg
        .auth
        .trusted_cas
        .iter()
        .enumerate()
        .map(|(i, hex)| {
            PublicKey::from_hex(hex).with_context(|| format!("auth.trusted_cas[{i}]"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BinderConfig::new(TrustAnchor::from_keys(keys))
        .with_clock_skew(Duration::from_secs(cfg.auth.clock_skew_secs))
        .with_revocation_timeout(Duration::from_millis(cfg.auth.revocation_timeout_ms)))
}

/// Convert one `[[policies]]` entry.
///
/// # Errors
///
/// Returns an error for an unknown capability or a rejected name.
pub fn to_policy(section: &PolicySection) -> Result<Policy> {
    let rules = section
        .paths
        .iter()
        .map(|path| {
            let caps = path
                .capabilities
                .iter()
                .map(|c| c.parse::<Capability>())
                .collect::<Result<CapabilitySet, _>>()
                .with_context(|| format!("policy '{}', pattern '{}'", section.name, path.pattern))?;
            Ok(Rule::new(path.pattern.as_str(), caps))
        })
        .collect::<Result<Vec<_>>>()?;

    Policy::new(section.name.as_str(), rules)
        .with_context(|| format!("policy '{}'", section.name))
}

/// Build a policy store holding every configured policy.
///
/// # Errors
///
/// Returns an error if any policy fails to convert.
pub fn to_policy_store(cfg: &Config) -> Result<Arc<PolicyStore>> {
    let store = Arc::new(PolicyStore::new());
    for section in &cfg.policies {
        store.put_policy(to_policy(section)?)?;
    }
    Ok(store)
}

fn to_binding(section: &BindingSection) -> Result<CertBinding> {
    CertBinding::new(section.name.as_str(), section.policies.iter().map(String::as_str))
        .with_token_period(Duration::from_secs(section.token_period_secs))
        .with_allowed_common_names(section.allowed_common_names.iter().map(String::as_str))
        .with_context(|| format!("binding '{}'", section.name))
}

/// Install every configured binding into `binder`.
///
/// # Errors
///
/// Returns an error if a binding's target or common-name globs are invalid.
pub fn install_bindings(cfg: &Config, binder: &IdentityBinder) -> Result<()> {
    for section in &cfg.bindings {
        let binding = to_binding(section)?;
        match (&section.issuer, &section.certificate) {
            (Some(issuer), None) => {
                let key_id = parse_key_id(issuer)
                    .with_context(|| format!("binding '{}' issuer", section.name))?;
                binder.bind_issuer(key_id, binding)?;
            },
            (None, Some(fingerprint)) => {
                let id = CertificateId::from_hex(fingerprint)
                    .with_context(|| format!("binding '{}' certificate", section.name))?;
                binder.bind_certificate(id, binding)?;
            },
            _ => bail!(
                "binding '{}' must set exactly one of issuer and certificate",
                section.name
            ),
        }
    }
    Ok(())
}

/// Assemble an evaluator from config.
///
/// # Errors
///
/// Returns an error if any section fails to convert.
pub fn to_evaluator(cfg: &Config) -> Result<AccessEvaluator> {
    let policies = to_policy_store(cfg)?;

    let binder = IdentityBinder::new(to_binder_config(cfg)?).with_revocation_checker(Arc::new(
        SerialRevocationList::new(cfg.auth.revoked_serials.iter().copied()),
    ));
    install_bindings(cfg, &binder)?;

    let context = AccessContext::new(policies, Arc::new(binder), to_resolver_config(cfg)?);
    Ok(AccessEvaluator::new(Arc::new(context)))
}
