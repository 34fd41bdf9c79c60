//! CLI command definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use loom_manifest::{
    Manifest, ManifestLoader, ManifestValidator, Placeholder, RuntimeManifest, SetupSpec,
};
use loom_options::DimensionSet;

pub mod resolve;
pub mod setup;
pub mod validate;

/// Loom - configurable project templates
#[derive(Parser)]
#[command(name = "loom")]
#[command(version, about = "Loom - configurable project templates")]
#[command(long_about = r#"
Loom creates projects from templates whose manifests declare configuration
dimensions, gates between them, features and placeholders. A template may
ship a setup module that customizes the generated project.

COMMANDS:
  validate  → Check a template manifest
  resolve   → Normalize option tokens against a template
  setup     → Create a project from a template

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Setup failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a template manifest
    Validate(validate::ValidateArgs),

    /// Resolve option tokens against a template's dimensions
    Resolve(resolve::ResolveArgs),

    /// Create a project from a template and run its setup
    Setup(setup::SetupArgs),
}

/// Failures detected by the CLI itself.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0} constraint violation(s) in the selection")]
    Constraints(usize),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Destination is not empty: {0} (use --force to write into it)")]
    DestinationNotEmpty(PathBuf),
}

/// The parts of a template the commands need, from either a validated or a
/// leniently read manifest.
pub struct Template {
    pub dir: PathBuf,
    pub id: String,
    pub name: String,
    pub dimensions: DimensionSet,
    pub placeholders: IndexMap<String, Placeholder>,
    pub setup: SetupSpec,
    /// Present only when fully validated; gates and features need it.
    pub manifest: Option<Manifest>,
}

impl Template {
    pub fn load(dir: PathBuf, lenient: bool) -> Result<Self> {
        let loader = ManifestLoader::new(&dir);
        let manifest_path = loader.manifest_path()?;
        let raw = loader
            .load()
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;

        if lenient {
            debug!("Reading {} leniently", manifest_path.display());
            let runtime = RuntimeManifest::from_raw(&raw)?;
            return Ok(Self {
                dir,
                id: runtime.id,
                name: runtime.name,
                dimensions: runtime.dimensions,
                placeholders: runtime.placeholders,
                setup: runtime.setup,
                manifest: None,
            });
        }

        let manifest = ManifestValidator::new()
            .validate(&raw)
            .with_context(|| format!("Invalid manifest {}", manifest_path.display()))?;
        Ok(Self {
            dir,
            id: manifest.id.clone(),
            name: manifest.name.clone(),
            dimensions: manifest.dimension_set()?,
            placeholders: manifest.placeholders.clone(),
            setup: manifest.setup.clone(),
            manifest: Some(manifest),
        })
    }
}
