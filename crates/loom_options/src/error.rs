//! Error types for option normalization.

use thiserror::Error;

/// Result type alias for option operations.
pub type OptionsResult<T> = Result<T, OptionsError>;

/// Errors raised while building a dimension schema or normalizing a selection.
///
/// Unknown dimensions and out-of-vocabulary values are not errors; they are
/// collected on the [`ResolvedSelection`](crate::ResolvedSelection) instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Empty assignment in token '{token}': at least one value is required")]
    EmptyAssignment { token: String },

    #[error("Missing dimension name in token '{token}'")]
    EmptyDimensionName { token: String },

    #[error("Dimension '{dimension}' accepts a single value but token '{token}' gives {count}")]
    Arity {
        dimension: String,
        token: String,
        count: usize,
    },

    #[error("Option '{value}' of dimension '{dimension}' requires '{missing}', which is not selected")]
    MissingDependency {
        dimension: String,
        value: String,
        missing: String,
    },

    #[error("Option '{value}' of dimension '{dimension}' conflicts with selected option '{conflicting}'")]
    Conflict {
        dimension: String,
        value: String,
        conflicting: String,
    },

    #[error("Default '{value}' of dimension '{dimension}' is not one of its allowed values")]
    InvalidDefault { dimension: String, value: String },

    #[error("Dimension '{dimension}' is single-valued but declares {count} default values")]
    DefaultArity { dimension: String, count: usize },

    #[error("Dimension declared twice: {0}")]
    DuplicateDimension(String),
}

impl OptionsError {
    /// Whether this error comes from a `requires`/`conflicts` rule rather than
    /// from token syntax or schema construction.
    pub fn is_dependency_error(&self) -> bool {
        matches!(
            self,
            OptionsError::MissingDependency { .. } | OptionsError::Conflict { .. }
        )
    }
}
