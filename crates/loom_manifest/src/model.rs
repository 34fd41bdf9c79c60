//! Template manifest definitions.
//!
//! A manifest declares the placeholders, dimensions, gates and features of a
//! template. Documents are read into a [`RawManifest`] first so validation can
//! report precise locations, then deserialized into a typed [`Manifest`].

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use loom_options::{DefaultValue, Dimension, DimensionKind, DimensionSet, ValuePolicy, CAPABILITY_DIMENSION};

use crate::error::ManifestResult;

/// Reserved name of the directory holding author-only setup assets.
pub const DEFAULT_ASSETS_DIR: &str = "__scaffold__";

/// Default file name of the setup module, relative to the template root.
pub const DEFAULT_SETUP_SCRIPT: &str = "_setup.mjs";

/// An unvalidated manifest document.
///
/// Object key order follows the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawManifest(Value);

impl RawManifest {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(content: &str) -> ManifestResult<Self> {
        Ok(Self(serde_json::from_str(content)?))
    }

    pub fn from_yaml_str(content: &str) -> ManifestResult<Self> {
        Ok(Self(serde_yaml::from_str(content)?))
    }

    /// Parse by file extension: `.json` as JSON, everything else as YAML.
    pub fn from_str_for_path(content: &str, path: &Path) -> ManifestResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(content),
            _ => Self::from_yaml_str(content),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Value type of a placeholder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderType {
    #[default]
    Text,
    Number,
    Boolean,
    Email,
    Url,
    Password,
}

impl PlaceholderType {
    pub const NAMES: [&'static str; 6] = ["text", "number", "boolean", "email", "url", "password"];

    pub fn name(&self) -> &'static str {
        match self {
            PlaceholderType::Text => "text",
            PlaceholderType::Number => "number",
            PlaceholderType::Boolean => "boolean",
            PlaceholderType::Email => "email",
            PlaceholderType::Url => "url",
            PlaceholderType::Password => "password",
        }
    }
}

/// A named substitution token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placeholder {
    pub description: String,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default, rename = "type")]
    pub value_type: PlaceholderType,
}

impl Placeholder {
    /// Default value rendered as text.
    pub fn default_text(&self) -> Option<String> {
        match &self.default {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// One selectable value of a dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionSpec {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholders: Vec<String>,
}

/// Dimension as declared in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSpec {
    #[serde(default, rename = "type")]
    pub kind: DimensionKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub options: Vec<OptionSpec>,
    #[serde(default)]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub policy: ValuePolicy,
    #[serde(default)]
    pub built_in: bool,
    #[serde(default)]
    pub requires: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub conflicts: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub placeholders: Vec<String>,
}

impl DimensionSpec {
    pub fn option(&self, id: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.id == id)
    }

    pub fn option_ids(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.id.as_str())
    }

    /// Convert into the normalizer's schema type.
    pub fn to_dimension(&self, id: &str) -> Dimension {
        Dimension {
            id: id.to_string(),
            kind: self.kind,
            allowed_values: self.option_ids().map(str::to_string).collect(),
            default: self.default.clone(),
            requires: self
                .requires
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            conflicts: self
                .conflicts
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            policy: self.policy,
            built_in: self.built_in,
        }
    }
}

/// How strongly a feature depends on a dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NeedLevel {
    Required,
    Optional,
    None,
}

impl NeedLevel {
    pub const NAMES: [&'static str; 3] = ["required", "optional", "none"];
}

/// An additive capability with infrastructure needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub needs: IndexMap<String, NeedLevel>,
    #[serde(default)]
    pub placeholders: Vec<String>,
}

/// Restrictions keyed by dimension, then option, then target dimension.
pub type GateMap = IndexMap<String, IndexMap<String, IndexMap<String, Vec<String>>>>;

fn default_setup_script() -> String {
    DEFAULT_SETUP_SCRIPT.to_string()
}

fn default_assets_dir() -> String {
    DEFAULT_ASSETS_DIR.to_string()
}

/// Setup block of a manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetupSpec {
    #[serde(default = "default_setup_script")]
    pub script: String,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

impl Default for SetupSpec {
    fn default() -> Self {
        Self {
            script: default_setup_script(),
            assets_dir: default_assets_dir(),
        }
    }
}

/// A validated template manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: u32,
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub placeholders: IndexMap<String, Placeholder>,
    pub dimensions: IndexMap<String, DimensionSpec>,
    #[serde(default)]
    pub gates: GateMap,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub setup: SetupSpec,
}

impl Manifest {
    /// Dimension schema in declaration order.
    pub fn dimension_set(&self) -> ManifestResult<DimensionSet> {
        let dimensions = self
            .dimensions
            .iter()
            .map(|(id, spec)| spec.to_dimension(id))
            .collect();
        Ok(DimensionSet::new(dimensions)?)
    }

    /// Dimension whose values switch features on: [`CAPABILITY_DIMENSION`]
    /// when declared, otherwise the first multi-valued dimension.
    pub fn catch_all_dimension(&self) -> Option<&str> {
        if self.dimensions.contains_key(CAPABILITY_DIMENSION) {
            return Some(CAPABILITY_DIMENSION);
        }
        self.dimensions
            .iter()
            .find(|(_, spec)| spec.kind == DimensionKind::Multi)
            .map(|(id, _)| id.as_str())
    }

    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Placeholders that are required and have no default.
    pub fn required_placeholders(&self) -> Vec<&str> {
        self.placeholders
            .iter()
            .filter(|(_, p)| p.required && p.default_text().is_none())
            .map(|(token, _)| token.as_str())
            .collect()
    }
}
