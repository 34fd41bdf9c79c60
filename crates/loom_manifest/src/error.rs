//! Error types for manifests.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors that can occur while loading or consuming a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Runtime manifest is missing required field: {0}")]
    MissingField(String),

    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid value for input {input}: {message}")]
    InvalidInput { input: String, message: String },

    #[error("Option error: {0}")]
    Options(#[from] loom_options::OptionsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Category of a manifest validation failure.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    /// The document does not have the expected shape (missing field, wrong type).
    SchemaError,
    /// A reference points at a dimension, option or placeholder that does not exist.
    DomainError,
    /// A well-typed value breaks a rule (pattern, uniqueness, default membership).
    ValidationError,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationErrorKind::SchemaError => "SCHEMA_ERROR",
            ValidationErrorKind::DomainError => "DOMAIN_ERROR",
            ValidationErrorKind::ValidationError => "VALIDATION_ERROR",
        };
        f.write_str(name)
    }
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a manifest, e.g. `dimensions.auth.options[2].id`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Structured validation failure with a machine-readable location.
#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
#[error("{kind} at {path}: {message}")]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub kind: ValidationErrorKind,
    pub message: String,
    pub path: FieldPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path,
            suggestion: None,
        }
    }

    pub fn schema(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::SchemaError, path, message)
    }

    pub fn domain(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::DomainError, path, message)
    }

    pub fn invalid(path: FieldPath, message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::ValidationError, path, message)
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_display() {
        let path = FieldPath::root()
            .key("dimensions")
            .key("auth")
            .key("options")
            .index(2)
            .key("id");
        assert_eq!(path.to_string(), "dimensions.auth.options[2].id");
        assert_eq!(FieldPath::root().to_string(), "<root>");
    }

    #[test]
    fn test_validation_error_serializes_for_cli() {
        let err = ValidationError::domain(FieldPath::root().key("gates").key("db"), "Unknown dimension")
            .with_suggestion(Some("did you mean `database`?".into()));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "DOMAIN_ERROR");
        assert_eq!(json["path"], serde_json::json!(["gates", "db"]));
        assert_eq!(json["suggestion"], "did you mean `database`?");
    }
}
