//! Capability objects handed to setup code.
//!
//! Each namespace is a plain struct scoped to the project directory; the
//! set is fixed and composed into [`Tools`].

pub mod files;
pub mod inputs;
pub mod json;
pub mod options;
pub mod placeholders;
pub mod templates;
pub mod text;

pub use files::{FileContent, FileTools};
pub use inputs::InputTools;
pub use json::{JsonKey, JsonTools};
pub use options::OptionTools;
pub use placeholders::PlaceholderTools;
pub use templates::{TemplateRenderer, TemplateTools};
pub use text::{Search, TextTools};

use crate::config::SandboxConfig;
use crate::context::SetupContext;
use crate::error::SandboxResult;
use crate::paths::ProjectRoot;

/// The full tool surface for one setup invocation.
#[derive(Debug, Clone)]
pub struct Tools {
    pub files: FileTools,
    pub json: JsonTools,
    pub text: TextTools,
    pub templates: TemplateTools,
    pub placeholders: PlaceholderTools,
    pub options: OptionTools,
    pub inputs: InputTools,
}

impl Tools {
    pub fn new(ctx: &SetupContext, config: &SandboxConfig) -> SandboxResult<Self> {
        let root = ProjectRoot::new(&ctx.project_directory)?;
        let assets = root.child(&config.assets_dir)?;
        let renderer = TemplateRenderer::new(config.placeholder_syntax.clone())?;

        let mut substitutions = templates::builtin_tokens(&ctx.project_name);
        substitutions.extend(ctx.inputs.as_map().iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(Self {
            files: FileTools::new(root.clone()),
            json: JsonTools::new(root.clone()),
            text: TextTools::new(root.clone()),
            templates: TemplateTools::new(root.clone(), assets, renderer.clone()),
            placeholders: PlaceholderTools::new(root, renderer, substitutions),
            options: OptionTools::new(ctx.selection.clone()),
            inputs: InputTools::new(ctx.inputs.clone()),
        })
    }
}
