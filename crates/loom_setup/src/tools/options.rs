//! Read-only queries over the resolved selection.

use std::collections::BTreeMap;
use std::sync::Arc;

use loom_options::{ResolvedSelection, SelectionValue};

use crate::error::{SandboxError, SandboxResult};

/// `tools.options`
#[derive(Debug, Clone)]
pub struct OptionTools {
    selection: Arc<ResolvedSelection>,
}

impl OptionTools {
    pub fn new(selection: Arc<ResolvedSelection>) -> Self {
        Self { selection }
    }

    /// Whether `value` is selected in any dimension.
    pub fn has(&self, value: &str) -> bool {
        self.selection.has(value)
    }

    /// Whether `value` is selected in `dimension`.
    pub fn in_dimension(&self, dimension: &str, value: &str) -> bool {
        self.selection.has_in(dimension, value)
    }

    pub fn require(&self, value: &str) -> SandboxResult<()> {
        if self.has(value) {
            Ok(())
        } else {
            Err(SandboxError::MissingOption(value.to_string()))
        }
    }

    /// Selected values of `dimension`, or the raw tokens when `None`.
    pub fn list(&self, dimension: Option<&str>) -> Vec<String> {
        match dimension {
            Some(dimension) => self
                .selection
                .values_of(dimension)
                .into_iter()
                .map(str::to_string)
                .collect(),
            None => self.selection.tokens.clone(),
        }
    }

    /// A copy of the full selection map.
    pub fn dimensions(&self) -> BTreeMap<String, SelectionValue> {
        self.selection.by_dimension.clone()
    }

    /// Run `f` only when `value` is selected.
    pub fn when<R>(&self, value: &str, f: impl FnOnce() -> R) -> Option<R> {
        self.has(value).then(f)
    }

    pub fn selection(&self) -> &ResolvedSelection {
        &self.selection
    }
}
