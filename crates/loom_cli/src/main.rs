//! Loom CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Setup failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod selection;

use commands::{Cli, CommandError, Commands};
use loom_manifest::{ManifestError, ValidationError};
use loom_options::OptionsError;
use loom_setup::SandboxError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const SETUP_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,loom={}", level)));
    // Logging may already be initialized; keep going either way.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Validate(args) => commands::validate::execute(args).await,
        Commands::Resolve(args) => commands::resolve::execute(args).await,
        Commands::Setup(args) => commands::setup::execute(args).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map the first recognized error in the chain to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<CommandError>() {
            return match err {
                CommandError::Constraints(_) => ExitCodes::VALIDATION_FAILURE,
                _ => ExitCodes::INVALID_ARGS,
            };
        }
        if cause.downcast_ref::<ValidationError>().is_some()
            || cause.downcast_ref::<OptionsError>().is_some()
        {
            return ExitCodes::VALIDATION_FAILURE;
        }
        if let Some(err) = cause.downcast_ref::<ManifestError>() {
            return match err {
                ManifestError::Invalid(_) | ManifestError::Options(_) => ExitCodes::VALIDATION_FAILURE,
                ManifestError::NotFound(_)
                | ManifestError::MissingInput(_)
                | ManifestError::InvalidInput { .. } => ExitCodes::INVALID_ARGS,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(err) = cause.downcast_ref::<SandboxError>() {
            return match err {
                SandboxError::InvalidArgument { operation, .. } if operation == "placeholder syntax" => {
                    ExitCodes::INVALID_ARGS
                }
                _ => ExitCodes::SETUP_ERROR,
            };
        }
    }
    ExitCodes::GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_categories() {
        let err = anyhow::Error::new(CommandError::Constraints(2));
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);

        let err = anyhow::Error::new(ManifestError::NotFound(PathBuf::from("t")));
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);

        let err: anyhow::Result<()> = Err(SandboxError::MissingOption("auth".to_string()).into());
        let err = err.context("Setup failed").unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::SETUP_ERROR);

        let err = "nope".parse::<loom_setup::PlaceholderSyntax>().unwrap_err();
        assert_eq!(categorize_error(&anyhow::Error::new(err)), ExitCodes::INVALID_ARGS);

        assert_eq!(categorize_error(&anyhow::anyhow!("boom")), ExitCodes::GENERAL_ERROR);
    }
}
