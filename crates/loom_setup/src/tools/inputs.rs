//! Read-only access to resolved placeholder values.

use std::collections::BTreeMap;

use loom_manifest::InputValues;

/// `tools.inputs`
#[derive(Debug, Clone)]
pub struct InputTools {
    values: InputValues,
}

impl InputTools {
    pub fn new(values: InputValues) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name)
    }

    pub fn get_or<'a>(&'a self, name: &str, fallback: &'a str) -> &'a str {
        self.values.get(name).unwrap_or(fallback)
    }

    /// A copy of every value.
    pub fn all(&self) -> BTreeMap<String, String> {
        self.values.as_map().clone()
    }
}
