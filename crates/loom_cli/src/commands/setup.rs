//! Setup command - Create a project from a template.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use loom_manifest::{resolve_inputs, ConstraintCheck, MANIFEST_FILE_NAMES};
use loom_options::normalize;
use loom_setup::{Environment, PlaceholderSyntax, SandboxConfig, SetupContext, SetupSandbox};

use super::{CommandError, Template};
use crate::selection::{parse_inputs, SelectionDocument};

#[derive(Args)]
pub struct SetupArgs {
    /// Template directory
    #[arg(short, long, env = "LOOM_TEMPLATE")]
    template: PathBuf,

    /// Destination directory for the new project
    #[arg(short, long)]
    output: PathBuf,

    /// Option tokens, e.g. `deployment=vercel features=auth+blog`
    tokens: Vec<String>,

    /// Project name (defaults to the destination directory name)
    #[arg(short, long)]
    name: Option<String>,

    /// Placeholder value as NAME=VALUE (repeatable)
    #[arg(short, long = "input", value_name = "NAME=VALUE")]
    inputs: Vec<String>,

    /// Stored selection document (JSON, YAML or TOML)
    #[arg(long, env = "LOOM_SELECTION")]
    selection: Option<PathBuf>,

    /// Placeholder syntax: mustache, dollar, or a sample such as `<%TOKEN%>`
    #[arg(long, env = "LOOM_PLACEHOLDER_SYNTAX", default_value = "mustache")]
    syntax: String,

    /// Keep the assets directory after setup
    #[arg(long, env = "LOOM_KEEP_ASSETS")]
    keep_assets: bool,

    /// Read the manifest with the lenient runtime check (skips gates and features)
    #[arg(long)]
    lenient: bool,

    /// Write into a non-empty destination
    #[arg(long)]
    force: bool,
}

pub async fn execute(args: SetupArgs) -> Result<()> {
    // The script engine is single-threaded and blocking.
    tokio::task::spawn_blocking(move || run(args))
        .await
        .context("Setup task panicked")?
}

fn run(args: SetupArgs) -> Result<()> {
    let syntax: PlaceholderSyntax = args.syntax.parse()?;
    let template = Template::load(args.template.clone(), args.lenient)?;
    info!("Creating project from template: {} ({})", template.name, template.id);

    let document = match &args.selection {
        Some(path) => SelectionDocument::load(path)?,
        None => SelectionDocument::default(),
    };

    let mut tokens = document.tokens.clone();
    tokens.extend(args.tokens.iter().cloned());
    let selection = normalize(&tokens, &template.dimensions).context("Invalid option selection")?;
    for token in &selection.unknown {
        warn!("Ignoring unknown option: {}", token);
    }

    if let Some(manifest) = &template.manifest {
        let violations = ConstraintCheck::evaluate(manifest, &selection);
        if !violations.is_empty() {
            for violation in &violations {
                eprintln!("   ❌ {}", violation.message);
            }
            return Err(CommandError::Constraints(violations.len()).into());
        }
    }

    let project_name = match &args.name {
        Some(name) => name.clone(),
        None => project_name_from(&args.output)?,
    };

    let mut provided = document.input_map()?;
    provided.extend(parse_inputs(&args.inputs)?);
    if template.placeholders.contains_key("PROJECT_NAME") {
        provided
            .entry("PROJECT_NAME".to_string())
            .or_insert_with(|| project_name.clone());
    }
    let inputs = resolve_inputs(&template.placeholders, &provided)?;

    prepare_destination(&args.output, args.force)?;
    let copied = copy_template(&template.dir, &args.output, &template.setup.script)?;
    info!("Copied {} file(s) into {}", copied, args.output.display());

    let mut config = SandboxConfig::default()
        .with_assets_dir(template.setup.assets_dir.clone())
        .with_placeholder_syntax(syntax);
    if args.keep_assets {
        config = config.keep_assets();
    }

    let ctx = SetupContext::new(&args.output, &project_name, inputs.values, selection);
    let env = Environment::new(ctx, &config)?;
    let sandbox = SetupSandbox::new(config);

    let script = template.dir.join(&template.setup.script);
    if script.is_file() {
        sandbox
            .run(&script, &env)
            .with_context(|| format!("Setup module {} failed", script.display()))?;
    } else {
        debug!("No setup module at {}", script.display());
        sandbox.cleanup_assets(&env)?;
    }

    println!("✅ Created {} at {}", project_name, args.output.display());
    Ok(())
}

fn project_name_from(output: &Path) -> Result<String> {
    let absolute = if output.is_absolute() {
        output.to_path_buf()
    } else {
        std::env::current_dir()?.join(output)
    };
    absolute
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "cannot derive a project name from {}; pass --name",
                output.display()
            ))
            .into()
        })
}

fn prepare_destination(output: &Path, force: bool) -> Result<()> {
    if output.exists() {
        let occupied = fs::read_dir(output)
            .with_context(|| format!("Failed to read {}", output.display()))?
            .next()
            .is_some();
        if occupied && !force {
            return Err(CommandError::DestinationNotEmpty(output.to_path_buf()).into());
        }
    }
    fs::create_dir_all(output)?;
    Ok(())
}

/// Copy the template tree, leaving out the manifest, the setup module and
/// version-control metadata. Returns the number of files copied.
fn copy_template(template_dir: &Path, output: &Path, setup_script: &str) -> Result<usize> {
    let skipped: Vec<PathBuf> = MANIFEST_FILE_NAMES
        .iter()
        .map(PathBuf::from)
        .chain(std::iter::once(PathBuf::from(setup_script)))
        .collect();

    let mut copied = 0;
    for entry in WalkDir::new(template_dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = entry?;
        let relative = entry.path().strip_prefix(template_dir)?;
        if skipped.iter().any(|s| s == relative) {
            continue;
        }
        let target = output.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
schemaVersion: 1
id: web-starter
name: Web Starter
description: Minimal web template
placeholders:
  PROJECT_NAME: { description: Project name, required: true }
  PORT: { description: Port, default: 3000, type: number }
dimensions:
  deployment:
    options: [{ id: vercel }, { id: cloudflare }]
    default: vercel
  database:
    options: [{ id: d1 }, { id: postgres }, { id: none }]
  features:
    type: multi
    options: [{ id: auth }, { id: docker }]
gates:
  deployment:
    cloudflare: { database: [d1, none] }
features:
  - id: auth
    label: Authentication
    needs: { database: required }
"#;

    const SETUP: &str = r#"
export default function setup({ ctx, tools }) {
  tools.placeholders.applyInputs(["README.md", "config/*.json"]);
  tools.json.set("package.json", "name", ctx.projectName);
  tools.options.when("docker", () => tools.templates.copy("docker", "docker"));
}
"#;

    fn template() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("template.yaml"), MANIFEST).unwrap();
        fs::write(dir.path().join("_setup.mjs"), SETUP).unwrap();
        fs::write(dir.path().join("README.md"), "# {{PROJECT_NAME}} on {{PORT}}\n").unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/app.json"), "{ \"port\": {{PORT}} }\n").unwrap();
        fs::create_dir_all(dir.path().join("__scaffold__/docker")).unwrap();
        fs::write(dir.path().join("__scaffold__/docker/Dockerfile"), "FROM node:20\n").unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        dir
    }

    fn args(template: &Path, output: &Path, tokens: &[&str]) -> SetupArgs {
        SetupArgs {
            template: template.to_path_buf(),
            output: output.to_path_buf(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            name: None,
            inputs: vec!["PORT=8080".to_string()],
            selection: None,
            syntax: "mustache".to_string(),
            keep_assets: false,
            lenient: false,
            force: false,
        }
    }

    #[test]
    fn test_setup_creates_project() {
        let template = template();
        let base = tempdir().unwrap();
        let output = base.path().join("shop");

        run(args(template.path(), &output, &["auth", "docker", "database=postgres"])).unwrap();

        assert_eq!(fs::read_to_string(output.join("README.md")).unwrap(), "# shop on 8080\n");
        assert_eq!(
            fs::read_to_string(output.join("config/app.json")).unwrap(),
            "{ \"port\": 8080 }\n"
        );
        assert!(output.join("docker/Dockerfile").is_file());
        assert!(output.join("package.json").is_file());
        assert!(!output.join("template.yaml").exists());
        assert!(!output.join("_setup.mjs").exists());
        assert!(!output.join("__scaffold__").exists());
        assert!(!output.join(".git").exists());
    }

    #[test]
    fn test_gate_violation_stops_before_copy() {
        let template = template();
        let base = tempdir().unwrap();
        let output = base.path().join("edge");

        let err = run(args(
            template.path(),
            &output,
            &["deployment=cloudflare", "database=postgres"],
        ))
        .unwrap_err();

        assert!(matches!(err.downcast_ref::<CommandError>(), Some(CommandError::Constraints(1))));
        assert!(!output.exists());
    }

    #[test]
    fn test_feature_need_enforced() {
        let template = template();
        let base = tempdir().unwrap();
        let err = run(args(template.path(), &base.path().join("app"), &["auth"])).unwrap_err();
        assert!(matches!(err.downcast_ref::<CommandError>(), Some(CommandError::Constraints(1))));
    }

    #[test]
    fn test_non_empty_destination_needs_force() {
        let template = template();
        let base = tempdir().unwrap();
        let output = base.path().join("taken");
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("keep.txt"), "x").unwrap();

        let err = run(args(template.path(), &output, &[])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CommandError>(),
            Some(CommandError::DestinationNotEmpty(_))
        ));

        let mut forced = args(template.path(), &output, &[]);
        forced.force = true;
        run(forced).unwrap();
        assert!(output.join("keep.txt").is_file());
        assert!(output.join("README.md").is_file());
    }

    #[test]
    fn test_keep_assets_and_name_override() {
        let template = template();
        let base = tempdir().unwrap();
        let output = base.path().join("out");

        let mut args = args(template.path(), &output, &[]);
        args.keep_assets = true;
        args.name = Some("Acme Store".to_string());
        run(args).unwrap();

        assert!(output.join("__scaffold__/docker/Dockerfile").is_file());
        assert!(fs::read_to_string(output.join("README.md"))
            .unwrap()
            .starts_with("# Acme Store"));
    }
}
