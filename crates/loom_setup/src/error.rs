//! Error types for the setup runtime.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for setup operations.
pub type SandboxResult<T> = Result<T, SandboxError>;

/// Errors raised while screening, loading or running setup code, and by
/// every tool call made from it.
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Disallowed construct '{construct}' ({category}) at line {line}")]
    DisallowedConstruct {
        construct: String,
        category: String,
        line: usize,
    },

    #[error("Setup module must export a function as its default export: {0}")]
    InvalidExport(String),

    #[error("Setup routine must take exactly one parameter, found {found}")]
    BadArity { found: u32 },

    #[error("Syntax error in setup module: {0}")]
    Syntax(String),

    #[error("Setup routine failed: {0}")]
    Execution(String),

    #[error("Path escapes the project directory: {0}")]
    PathEscape(String),

    #[error("Marker '{marker}' not found in {file}")]
    MissingMarker { file: PathBuf, marker: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Destination already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("No match for '{search}' in {file}")]
    NoMatch { file: PathBuf, search: String },

    #[error("Invalid argument for {operation}: {message}")]
    InvalidArgument { operation: String, message: String },

    #[error("Required option is not selected: {0}")]
    MissingOption(String),

    #[error("Setup module not found: {0}")]
    ModuleNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SandboxError {
    pub fn invalid_argument(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether the error points at a bug in the template's setup code rather
    /// than at user input or the environment.
    pub fn is_authoring_error(&self) -> bool {
        matches!(
            self,
            SandboxError::DisallowedConstruct { .. }
                | SandboxError::InvalidExport(_)
                | SandboxError::BadArity { .. }
                | SandboxError::Syntax(_)
        )
    }
}
