//! The Environment passed to setup routines.

use std::path::PathBuf;
use std::sync::Arc;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use loom_manifest::InputValues;
use loom_options::ResolvedSelection;

use crate::config::SandboxConfig;
use crate::error::SandboxResult;
use crate::paths::ProjectRoot;
use crate::tools::Tools;

/// Data describing the project being set up.
#[derive(Debug, Clone)]
pub struct SetupContext {
    pub project_directory: PathBuf,
    pub project_name: String,
    pub inputs: InputValues,
    pub selection: Arc<ResolvedSelection>,
}

impl SetupContext {
    pub fn new(
        project_directory: impl Into<PathBuf>,
        project_name: impl Into<String>,
        inputs: InputValues,
        selection: ResolvedSelection,
    ) -> Self {
        Self {
            project_directory: project_directory.into(),
            project_name: project_name.into(),
            inputs,
            selection: Arc::new(selection),
        }
    }

    /// Serializable view exposed to scripts as `ctx`.
    pub fn to_json(&self) -> SandboxResult<Value> {
        let view = ContextView {
            project_directory: self.project_directory.display().to_string(),
            project_name: &self.project_name,
            inputs: self.inputs.as_map(),
            selection: &self.selection,
        };
        Ok(serde_json::to_value(view)?)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContextView<'a> {
    project_directory: String,
    project_name: &'a str,
    inputs: &'a BTreeMap<String, String>,
    selection: &'a ResolvedSelection,
}

/// `{ ctx, tools }` for one setup invocation.
#[derive(Debug, Clone)]
pub struct Environment {
    pub ctx: SetupContext,
    pub tools: Tools,
}

impl Environment {
    pub fn new(ctx: SetupContext, config: &SandboxConfig) -> SandboxResult<Self> {
        let tools = Tools::new(&ctx, config)?;
        Ok(Self { ctx, tools })
    }

    pub fn project_root(&self) -> SandboxResult<ProjectRoot> {
        ProjectRoot::new(&self.ctx.project_directory)
    }
}
