//! Check command: would this certificate be allowed to do this?

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use vigil_access::AccessResult;
use vigil_auth::{ClientCertificate, Credential};
use vigil_config::Config;
use vigil_policy::Decision;

use crate::config_bridge;
use crate::theme::Theme;

/// Authorize `operation` on `path` for the certificate in `cert_path`.
///
/// Returns whether the request is allowed. Authentication failures are
/// reported as a deny, the way the engine's callers see them.
pub(crate) async fn run_check(
    config: &Config,
    cert_path: &Path,
    path: &str,
    operation: &str,
    json: bool,
) -> Result<bool> {
    let pem = std::fs::read_to_string(cert_path)
        .with_context(|| format!("failed to read {}", cert_path.display()))?;
    let certificate = ClientCertificate::from_pem(&pem)
        .with_context(|| format!("failed to parse {}", cert_path.display()))?;
    let credential = Credential::Certificate(certificate);

    let evaluator = config_bridge::to_evaluator(config)?;
    let outcome = evaluator.authorize_raw(&credential, path, operation).await;
    if let Err(e) = &outcome {
        tracing::debug!(error = %e, "Check failed");
    }

    print!("{}", render(&outcome, path, operation, json)?);
    Ok(outcome.is_ok_and(|decision| decision.allowed))
}

/// Format a check outcome. Errors show only their public message.
fn render(
    outcome: &AccessResult<Decision>,
    path: &str,
    operation: &str,
    json: bool,
) -> Result<String> {
    let mut out = String::new();
    match outcome {
        Ok(decision) if json => {
            writeln!(out, "{}", serde_json::to_string_pretty(decision)?)?;
        },
        Ok(decision) => {
            if decision.allowed {
                writeln!(out, "{}", Theme::success(&format!("{operation} {path}: allowed")))?;
            } else {
                writeln!(
                    out,
                    "{}",
                    Theme::error(&format!("{operation} {path}: denied ({})", decision.reason))
                )?;
            }
            if let Some(rule) = &decision.matched {
                writeln!(
                    out,
                    "  {}",
                    Theme::dimmed(&format!(
                        "matched {} in {} [{}]",
                        rule.pattern, rule.policy, rule.capabilities
                    ))
                )?;
            }
        },
        Err(e) if json => {
            writeln!(
                out,
                "{}",
                serde_json::json!({ "allowed": false, "error": e.public_message() })
            )?;
        },
        Err(e) => {
            writeln!(
                out,
                "{}",
                Theme::error(&format!("{operation} {path}: {}", e.public_message()))
            )?;
        },
    }
    Ok(out)
}
