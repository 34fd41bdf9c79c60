//! # loom_setup
//!
//! Environment/Tools contract and setup runtime for Loom.
//!
//! After a template is copied into a new project, its author-supplied setup
//! code customizes the result. That code receives a single
//! [`Environment`] (`{ ctx, tools }`) and can only reach the project through
//! the tools, all of which are confined to the project directory.
//!
//! # Features
//!
//! - **JavaScript setup modules**: run on an embedded engine with no module
//!   loader, file system or network access ([`SetupSandbox::run`])
//! - **Native routines**: the same contract from Rust ([`SetupRoutine`])
//! - **Capability screening**: module inclusion and dynamic evaluation are
//!   rejected before execution ([`CapabilityPolicy`])
//! - **Tools**: files, JSON, text, templates, placeholders, options, inputs
//!
//! # Example
//!
//! ```rust,no_run
//! use loom_manifest::InputValues;
//! use loom_options::ResolvedSelection;
//! use loom_setup::{Environment, SandboxConfig, SetupContext, SetupSandbox};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SandboxConfig::default();
//!     let ctx = SetupContext::new("my-app", "my-app", InputValues::new(), ResolvedSelection::default());
//!     let env = Environment::new(ctx, &config)?;
//!
//!     SetupSandbox::new(config).run(Path::new("templates/web/_setup.mjs"), &env)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod paths;
pub mod policy;
pub mod routine;
pub mod sandbox;
mod script;
pub mod tools;

pub use config::{PlaceholderSyntax, SandboxConfig};
pub use context::{Environment, SetupContext};
pub use error::{SandboxError, SandboxResult};
pub use paths::ProjectRoot;
pub use policy::{CapabilityPolicy, ConstructRule};
pub use routine::SetupRoutine;
pub use sandbox::SetupSandbox;
pub use tools::{
    FileContent, FileTools, InputTools, JsonKey, JsonTools, OptionTools, PlaceholderTools, Search,
    TemplateRenderer, TemplateTools, TextTools, Tools,
};
