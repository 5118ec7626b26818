//! Vigil CLI - inspect and exercise a Vigil access configuration.
//!
//! Reads the layered configuration (defaults, `~/.vigil/config.toml`, an
//! optional `--config` file, `VIGIL_*` env vars), builds the same evaluator
//! the secret store would, and answers questions against it.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
pub mod config_bridge;
mod theme;

use commands::{cert, check, config, policy};

/// Vigil - certificate-authenticated access control
#[derive(Parser)]
#[command(name = "vigil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file, merged over the user config
    #[arg(short, long, global = true, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a certificate may perform an operation on a path
    Check {
        /// Armored client certificate
        #[arg(long)]
        cert: PathBuf,

        /// Request path, e.g. kv/data/foo
        #[arg(long)]
        path: String,

        /// Operation: create, read, update, delete, list or sudo
        #[arg(long, default_value = "read")]
        op: String,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect client certificates
    Cert {
        #[command(subcommand)]
        command: CertCommands,
    },

    /// Inspect configured policies
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },

    /// View and validate configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum CertCommands {
    /// Show a certificate's fields and trust status
    Inspect {
        /// Armored client certificate
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum PolicyCommands {
    /// List policies
    List,
    /// Print one policy as TOML
    Show {
        /// Policy name
        name: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration with value sources
    Show {
        /// Output format (toml, json)
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Validate the configuration and build the evaluator
    Validate,
    /// List the configuration files consulted
    Paths,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let explicit = cli.config.as_deref();

    let loaded = vigil_config::Config::load(explicit);

    let log_config = match &loaded {
        Ok(resolved) => {
            let mut lc = config_bridge::to_log_config(&resolved.config);
            if cli.verbose {
                "debug".clone_into(&mut lc.level);
            }
            lc
        },
        Err(_) => {
            let level = if cli.verbose { "debug" } else { "warn" };
            vigil_telemetry::LogConfig::new(level)
        },
    };
    if let Err(e) = vigil_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Config { command } => {
            match command {
                ConfigCommands::Show { format } => config::show_config(&loaded?, &format)?,
                ConfigCommands::Validate => config::validate_config(&loaded?)?,
                ConfigCommands::Paths => config::show_paths(explicit),
            }
            Ok(ExitCode::SUCCESS)
        },
        Commands::Check {
            cert,
            path,
            op,
            json,
        } => {
            let resolved = loaded?;
            let allowed = check::run_check(&resolved.config, &cert, &path, &op, json).await?;
            Ok(if allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        },
        Commands::Cert { command } => {
            let resolved = loaded?;
            match command {
                CertCommands::Inspect { path } => {
                    cert::inspect_certificate(&resolved.config, &path)?;
                },
            }
            Ok(ExitCode::SUCCESS)
        },
        Commands::Policy { command } => {
            let resolved = loaded?;
            match command {
                PolicyCommands::List => policy::list_policies(&resolved.config)?,
                PolicyCommands::Show { name } => policy::show_policy(&resolved.config, &name)?,
            }
            Ok(ExitCode::SUCCESS)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "vigil", "check", "--cert", "test1.pem", "--path", "kv/data/foo", "--op", "list",
        ])
        .unwrap();
        match cli.command {
            Commands::Check { path, op, json, .. } => {
                assert_eq!(path, "kv/data/foo");
                assert_eq!(op, "list");
                assert!(!json);
            },
            _ => panic!("expected check"),
        }
    }
}
