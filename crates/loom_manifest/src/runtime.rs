//! Lenient execution-time manifest check.
//!
//! When a template is consumed (rather than authored) only the fields needed
//! to run it matter. This path accepts any document with a string `id`, a
//! string `name` and an object `dimensions`; everything else is best effort.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use loom_options::{Dimension, DimensionSet};

use crate::error::{ManifestError, ManifestResult};
use crate::model::{DimensionSpec, Placeholder, RawManifest, SetupSpec};

/// The subset of a manifest needed to run a template.
#[derive(Debug, Clone)]
pub struct RuntimeManifest {
    pub id: String,
    pub name: String,
    pub dimensions: DimensionSet,
    pub placeholders: IndexMap<String, Placeholder>,
    pub setup: SetupSpec,
}

impl RuntimeManifest {
    pub fn from_raw(raw: &RawManifest) -> ManifestResult<Self> {
        let root = raw
            .as_value()
            .as_object()
            .ok_or_else(|| ManifestError::MissingField("<root object>".to_string()))?;

        let id = required_string(root.get("id"), "id")?;
        let name = required_string(root.get("name"), "name")?;
        let dimension_map = root
            .get("dimensions")
            .and_then(Value::as_object)
            .ok_or_else(|| ManifestError::MissingField("dimensions".to_string()))?;

        let mut dimensions = Vec::with_capacity(dimension_map.len());
        for (dimension_id, value) in dimension_map {
            match serde_json::from_value::<DimensionSpec>(value.clone()) {
                Ok(spec) => dimensions.push(lenient_dimension(spec.to_dimension(dimension_id))),
                Err(e) => debug!("Skipping unreadable dimension '{}': {}", dimension_id, e),
            }
        }

        let mut placeholders = IndexMap::new();
        if let Some(map) = root.get("placeholders").and_then(Value::as_object) {
            for (token, value) in map {
                match serde_json::from_value::<Placeholder>(value.clone()) {
                    Ok(placeholder) => {
                        placeholders.insert(token.clone(), placeholder);
                    }
                    Err(e) => debug!("Skipping unreadable placeholder '{}': {}", token, e),
                }
            }
        }

        let setup = root
            .get("setup")
            .and_then(|v| serde_json::from_value::<SetupSpec>(v.clone()).ok())
            .unwrap_or_default();

        Ok(Self {
            id,
            name,
            dimensions: DimensionSet::new(dedup(dimensions))?,
            placeholders,
            setup,
        })
    }
}

fn required_string(value: Option<&Value>, field: &str) -> ManifestResult<String> {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ManifestError::MissingField(field.to_string()))
}

/// Drop a default that breaks the schema instead of rejecting the dimension.
fn lenient_dimension(mut dimension: Dimension) -> Dimension {
    if dimension.check().is_err() {
        debug!("Ignoring invalid default of dimension '{}'", dimension.id);
        dimension.default = None;
    }
    dimension
}

fn dedup(dimensions: Vec<Dimension>) -> Vec<Dimension> {
    let mut seen = std::collections::HashSet::new();
    dimensions
        .into_iter()
        .filter(|d| seen.insert(d.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_document_accepted() {
        let raw = RawManifest::from_value(json!({
            "id": "Not A Valid Id",
            "name": "Loose",
            "dimensions": {
                "db": { "options": [{ "id": "pg" }, { "id": "pg" }], "default": "mysql" },
                "broken": { "options": "nope" }
            },
            "gates": "ignored"
        }));

        let manifest = RuntimeManifest::from_raw(&raw).unwrap();
        assert_eq!(manifest.id, "Not A Valid Id");
        assert_eq!(manifest.dimensions.len(), 1);
        assert!(manifest.dimensions.get("db").unwrap().default.is_none());
        assert_eq!(manifest.setup, SetupSpec::default());
    }

    #[test]
    fn test_missing_required_field() {
        let raw = RawManifest::from_value(json!({ "id": "x", "dimensions": {} }));
        let err = RuntimeManifest::from_raw(&raw).unwrap_err();
        assert!(matches!(err, ManifestError::MissingField(field) if field == "name"));
    }
}
