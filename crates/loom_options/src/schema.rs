//! Dimension schema definitions.
//!
//! A dimension is one axis of configuration choice (deployment target,
//! database, feature set, ...). The schema is pure data: it describes which
//! values an axis accepts, its default, and the `requires`/`conflicts` rules
//! attached to individual values.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{OptionsError, OptionsResult};

/// Name of the dimension that receives bare (`value` rather than
/// `dimension=value`) tokens when it is declared.
pub const CAPABILITY_DIMENSION: &str = "features";

/// Whether a dimension holds one value or a set of values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    #[default]
    Single,
    Multi,
}

/// How out-of-vocabulary values are treated for a dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValuePolicy {
    /// Unknown values are dropped and reported in `unknown`.
    #[default]
    Strict,
    /// Unknown values are kept and a warning is recorded.
    Warn,
}

/// Declared default of a dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DefaultValue {
    One(String),
    Many(Vec<String>),
}

impl DefaultValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            DefaultValue::One(v) => vec![v.as_str()],
            DefaultValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

/// A configuration axis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub id: String,
    #[serde(default)]
    pub kind: DimensionKind,
    pub allowed_values: Vec<String>,
    #[serde(default)]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub requires: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub conflicts: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub policy: ValuePolicy,
    #[serde(default)]
    pub built_in: bool,
}

impl Dimension {
    fn new<I, S>(id: impl Into<String>, kind: DimensionKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            kind,
            allowed_values: values.into_iter().map(Into::into).collect(),
            default: None,
            requires: BTreeMap::new(),
            conflicts: BTreeMap::new(),
            policy: ValuePolicy::Strict,
            built_in: false,
        }
    }

    /// Create a single-valued dimension.
    pub fn single<I, S>(id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, DimensionKind::Single, values)
    }

    /// Create a multi-valued dimension.
    pub fn multi<I, S>(id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, DimensionKind::Multi, values)
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::One(value.into()));
        self
    }

    pub fn with_defaults<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default = Some(DefaultValue::Many(
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn with_policy(mut self, policy: ValuePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn requires<I, S>(mut self, value: impl Into<String>, needed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires
            .insert(value.into(), needed.into_iter().map(Into::into).collect());
        self
    }

    pub fn conflicts<I, S>(mut self, value: impl Into<String>, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflicts
            .insert(value.into(), excluded.into_iter().map(Into::into).collect());
        self
    }

    pub fn built_in(mut self) -> Self {
        self.built_in = true;
        self
    }

    pub fn is_multi(&self) -> bool {
        self.kind == DimensionKind::Multi
    }

    /// Check whether `value` is one of the declared values.
    pub fn allows(&self, value: &str) -> bool {
        self.allowed_values.iter().any(|v| v == value)
    }

    /// Check the schema invariants of this dimension.
    pub fn check(&self) -> OptionsResult<()> {
        if let Some(default) = &self.default {
            let values = default.values();
            if !self.is_multi() && values.len() > 1 {
                return Err(OptionsError::DefaultArity {
                    dimension: self.id.clone(),
                    count: values.len(),
                });
            }
            if let Some(bad) = values.into_iter().find(|v| !self.allows(v)) {
                return Err(OptionsError::InvalidDefault {
                    dimension: self.id.clone(),
                    value: bad.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// An ordered collection of dimensions with lookup by id.
///
/// Declaration order matters: it decides the catch-all dimension when no
/// [`CAPABILITY_DIMENSION`] exists and the order dependency rules are checked in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSet {
    dimensions: Vec<Dimension>,
    index: HashMap<String, usize>,
}

impl DimensionSet {
    /// Build a set, checking every dimension's invariants.
    pub fn new(dimensions: Vec<Dimension>) -> OptionsResult<Self> {
        let mut index = HashMap::with_capacity(dimensions.len());
        for (position, dimension) in dimensions.iter().enumerate() {
            dimension.check()?;
            if index.insert(dimension.id.clone(), position).is_some() {
                return Err(OptionsError::DuplicateDimension(dimension.id.clone()));
            }
        }
        Ok(Self { dimensions, index })
    }

    pub fn get(&self, id: &str) -> Option<&Dimension> {
        self.index.get(id).map(|&i| &self.dimensions[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.iter()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// The dimension that receives bare tokens: [`CAPABILITY_DIMENSION`] when
    /// declared, otherwise the first multi-valued dimension.
    pub fn catch_all(&self) -> Option<&Dimension> {
        self.get(CAPABILITY_DIMENSION)
            .or_else(|| self.dimensions.iter().find(|d| d.is_multi()))
    }

    /// Find the dimension declaring `value` as an allowed value.
    pub fn owner_of(&self, value: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.allows(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_must_be_allowed() {
        let dim = Dimension::single("auth", ["jwt", "session"]).with_default("oauth");
        assert_eq!(
            dim.check(),
            Err(OptionsError::InvalidDefault {
                dimension: "auth".into(),
                value: "oauth".into()
            })
        );
    }

    #[test]
    fn test_single_rejects_many_defaults() {
        let dim = Dimension::single("auth", ["jwt", "session"]).with_defaults(["jwt", "session"]);
        assert!(matches!(dim.check(), Err(OptionsError::DefaultArity { count: 2, .. })));
    }

    #[test]
    fn test_catch_all_prefers_capability_dimension() {
        let set = DimensionSet::new(vec![
            Dimension::multi("tooling", ["lint"]),
            Dimension::multi(CAPABILITY_DIMENSION, ["auth"]),
        ])
        .unwrap();
        assert_eq!(set.catch_all().unwrap().id, CAPABILITY_DIMENSION);

        let set = DimensionSet::new(vec![
            Dimension::single("deployment", ["vercel"]),
            Dimension::multi("tooling", ["lint"]),
        ])
        .unwrap();
        assert_eq!(set.catch_all().unwrap().id, "tooling");
    }

    #[test]
    fn test_duplicate_dimension() {
        let err = DimensionSet::new(vec![
            Dimension::single("db", ["pg"]),
            Dimension::single("db", ["mysql"]),
        ])
        .unwrap_err();
        assert_eq!(err, OptionsError::DuplicateDimension("db".into()));
    }

    #[test]
    fn test_dimension_deserializes_camel_case() {
        let dim: Dimension = serde_json::from_value(serde_json::json!({
            "id": "features",
            "kind": "multi",
            "allowedValues": ["auth", "billing"],
            "default": ["auth"],
            "policy": "warn",
            "builtIn": true
        }))
        .unwrap();
        assert!(dim.is_multi());
        assert!(dim.built_in);
        assert_eq!(dim.policy, ValuePolicy::Warn);
        assert_eq!(dim.default, Some(DefaultValue::Many(vec!["auth".into()])));
    }
}
