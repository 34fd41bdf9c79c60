//! Resolve command - Normalize option tokens against a template.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use loom_manifest::ConstraintCheck;
use loom_options::normalize;

use super::{CommandError, Template};
use crate::selection::SelectionDocument;

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Template directory
    #[arg(short, long, env = "LOOM_TEMPLATE")]
    template: PathBuf,

    /// Option tokens, e.g. `deployment=vercel features=auth+blog`
    tokens: Vec<String>,

    /// Stored selection document whose tokens come first
    #[arg(long, env = "LOOM_SELECTION")]
    selection: Option<PathBuf>,

    /// Read the manifest with the lenient runtime check
    #[arg(long)]
    lenient: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn execute(args: ResolveArgs) -> Result<()> {
    let template = Template::load(args.template, args.lenient)?;
    info!("Resolving selection for template: {}", template.id);

    let mut tokens = match &args.selection {
        Some(path) => SelectionDocument::load(path)?.tokens,
        None => Vec::new(),
    };
    tokens.extend(args.tokens);

    let selection = normalize(&tokens, &template.dimensions)?;
    for warning in &selection.warnings {
        warn!("{}", warning);
    }
    for token in &selection.unknown {
        warn!("Ignoring unknown option: {}", token);
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&selection)?,
        OutputFormat::Yaml => serde_yaml::to_string(&selection)?,
    };
    println!("{}", output);

    let violations = match &template.manifest {
        Some(manifest) => ConstraintCheck::evaluate(manifest, &selection),
        None => Vec::new(),
    };
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("   ❌ {}", violation.message);
        }
        return Err(CommandError::Constraints(violations.len()).into());
    }
    Ok(())
}
