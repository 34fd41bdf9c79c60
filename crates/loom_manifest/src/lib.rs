//! # loom_manifest
//!
//! Template manifest model and validation for Loom.
//!
//! A manifest declares a template's placeholders, dimensions, gates and
//! features. This crate handles:
//!
//! - **Loading**: reading `template.yaml` / `template.json` into a [`RawManifest`]
//! - **Validation**: strict structural and referential checks with precise
//!   error locations ([`ManifestValidator`], [`ValidationCache`])
//! - **Runtime consumption**: a lenient minimal reader ([`RuntimeManifest`])
//! - **Constraints**: gate and feature-need checks on a resolved selection
//! - **Inputs**: placeholder value resolution
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use loom_manifest::{ManifestLoader, ValidationCache};
//!
//! let raw = Rc::new(ManifestLoader::new("templates/web-starter").load().unwrap());
//! let cache = ValidationCache::new();
//! match cache.validate(&raw) {
//!     Ok(manifest) => println!("{} is valid", manifest.name),
//!     Err(e) => eprintln!("{} ({})", e.message, e.path),
//! }
//! ```

pub mod cache;
pub mod constraints;
pub mod error;
pub mod inputs;
pub mod loader;
pub mod model;
pub mod runtime;
pub mod validator;

pub use cache::ValidationCache;
pub use constraints::{ConstraintCheck, ConstraintKind, ConstraintViolation};
pub use error::{
    FieldPath, ManifestError, ManifestResult, PathSegment, ValidationError, ValidationErrorKind,
};
pub use inputs::{resolve_inputs, InputValues, ResolvedInputs};
pub use loader::{ManifestLoader, MANIFEST_FILE_NAMES};
pub use model::{
    DimensionSpec, Feature, GateMap, Manifest, NeedLevel, OptionSpec, Placeholder,
    PlaceholderType, RawManifest, SetupSpec, DEFAULT_ASSETS_DIR, DEFAULT_SETUP_SCRIPT,
};
pub use runtime::RuntimeManifest;
pub use validator::ManifestValidator;
