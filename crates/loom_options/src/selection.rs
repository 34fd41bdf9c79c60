//! The resolved selection produced by the normalizer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Value(s) selected for one dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SelectionValue {
    Multi(Vec<String>),
    Single(Option<String>),
}

impl SelectionValue {
    /// Selected values as a flat list (empty for an unset single value).
    pub fn values(&self) -> Vec<&str> {
        match self {
            SelectionValue::Multi(values) => values.iter().map(String::as_str).collect(),
            SelectionValue::Single(value) => value.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values().contains(&value)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SelectionValue::Multi(values) => values.is_empty(),
            SelectionValue::Single(value) => value.is_none(),
        }
    }
}

/// Validated, normalized selection for one end-user run.
///
/// Built once by [`normalize`](crate::normalize) and treated as immutable
/// afterwards; consumers receive it by reference or behind an `Arc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSelection {
    /// Selected value(s) keyed by dimension id.
    pub by_dimension: BTreeMap<String, SelectionValue>,
    /// Human-readable notes about values kept under a `warn` policy.
    pub warnings: Vec<String>,
    /// Tokens (or `dimension=value` pairs) that could not be placed.
    pub unknown: Vec<String>,
    /// The raw tokens, trimmed, in the order they were given.
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl ResolvedSelection {
    pub fn get(&self, dimension: &str) -> Option<&SelectionValue> {
        self.by_dimension.get(dimension)
    }

    /// Selected values of one dimension; empty when the dimension is unknown.
    pub fn values_of(&self, dimension: &str) -> Vec<&str> {
        self.by_dimension
            .get(dimension)
            .map(SelectionValue::values)
            .unwrap_or_default()
    }

    /// Every selected value id across all dimensions.
    pub fn all_values(&self) -> BTreeSet<&str> {
        self.by_dimension
            .values()
            .flat_map(SelectionValue::values)
            .collect()
    }

    /// Whether `value` is selected in any dimension.
    pub fn has(&self, value: &str) -> bool {
        self.by_dimension.values().any(|v| v.contains(value))
    }

    /// Whether `value` is selected in `dimension`.
    pub fn has_in(&self, dimension: &str, value: &str) -> bool {
        self.by_dimension
            .get(dimension)
            .is_some_and(|v| v.contains(value))
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.unknown.is_empty()
    }
}
