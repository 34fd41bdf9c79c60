//! Validate command - Check a template manifest.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;
use tracing::info;

use loom_manifest::{ManifestLoader, ManifestValidator};

#[derive(Args)]
pub struct ValidateArgs {
    /// Template directory containing template.yaml / template.json
    #[arg(default_value = ".", env = "LOOM_TEMPLATE")]
    template: PathBuf,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let loader = ManifestLoader::new(&args.template);
    let manifest_path = loader.manifest_path()?;
    info!("Validating manifest: {}", manifest_path.display());

    let raw = loader.load()?;
    match ManifestValidator::new().validate(&raw) {
        Ok(manifest) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "valid": true, "id": manifest.id }))?
                );
            } else {
                println!("✅ {} ({}) is valid", manifest.name, manifest.id);
                println!("   {} dimension(s), {} feature(s), {} placeholder(s)",
                    manifest.dimensions.len(),
                    manifest.features.len(),
                    manifest.placeholders.len()
                );
            }
            Ok(())
        }
        Err(error) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "valid": false, "error": error }))?
                );
            } else {
                println!("❌ {}", manifest_path.display());
                println!("   {}: {}", error.kind, error.message);
                println!("   at {}", error.path);
                if let Some(suggestion) = &error.suggestion {
                    println!("   💡 {}", suggestion);
                }
            }
            Err(error.into())
        }
    }
}
