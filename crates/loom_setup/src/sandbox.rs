//! Setup execution.
//!
//! [`SetupSandbox`] runs either a JavaScript setup module or a native
//! [`SetupRoutine`] against an [`Environment`]. Modules are screened by the
//! configured [`CapabilityPolicy`](crate::policy::CapabilityPolicy) before
//! they are parsed, so a rejected module never touches the project.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::SandboxConfig;
use crate::context::Environment;
use crate::error::{SandboxError, SandboxResult};
use crate::routine::SetupRoutine;
use crate::script;

/// Runs setup code for one project.
#[derive(Debug, Clone, Default)]
pub struct SetupSandbox {
    config: SandboxConfig,
}

impl SetupSandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Run the setup module at `module_path`.
    pub fn run(&self, module_path: &Path, env: &Environment) -> SandboxResult<()> {
        if !module_path.is_file() {
            return Err(SandboxError::ModuleNotFound(module_path.to_path_buf()));
        }
        let source = fs::read_to_string(module_path)?;
        self.run_source(&source, env)
    }

    /// Run setup module source text.
    pub fn run_source(&self, source: &str, env: &Environment) -> SandboxResult<()> {
        self.config.policy.screen(source)?;
        info!("Running setup module for '{}'", env.ctx.project_name);
        script::run_module(source, env)?;
        self.cleanup_assets(env)?;
        Ok(())
    }

    /// Run a native routine with the same Environment contract.
    pub fn run_routine(&self, routine: &dyn SetupRoutine, env: &Environment) -> SandboxResult<()> {
        info!("Running native setup routine for '{}'", env.ctx.project_name);
        routine.run(env)?;
        self.cleanup_assets(env)?;
        Ok(())
    }

    /// Remove the assets directory unless the config keeps it. Returns whether
    /// anything was removed.
    pub fn cleanup_assets(&self, env: &Environment) -> SandboxResult<bool> {
        if !self.config.remove_assets {
            debug!("Keeping assets directory '{}'", self.config.assets_dir);
            return Ok(false);
        }
        let assets = env.project_root()?.resolve(&self.config.assets_dir)?;
        if !assets.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&assets)?;
        info!("Removed assets directory '{}'", self.config.assets_dir);
        Ok(true)
    }
}
