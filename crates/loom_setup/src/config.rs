//! Sandbox configuration.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use loom_manifest::DEFAULT_ASSETS_DIR;

use crate::error::{SandboxError, SandboxResult};
use crate::policy::CapabilityPolicy;

/// Token delimiters used by template substitution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaceholderSyntax {
    /// `{{TOKEN}}`
    #[default]
    Mustache,
    /// `${TOKEN}`
    Dollar,
    /// Any non-empty opening and closing delimiters.
    Custom { open: String, close: String },
}

impl PlaceholderSyntax {
    pub fn custom(open: impl Into<String>, close: impl Into<String>) -> SandboxResult<Self> {
        let (open, close) = (open.into(), close.into());
        if open.is_empty() || close.is_empty() {
            return Err(SandboxError::invalid_argument(
                "placeholder syntax",
                "delimiters must not be empty",
            ));
        }
        Ok(Self::Custom { open, close })
    }

    pub fn delimiters(&self) -> (&str, &str) {
        match self {
            PlaceholderSyntax::Mustache => ("{{", "}}"),
            PlaceholderSyntax::Dollar => ("${", "}"),
            PlaceholderSyntax::Custom { open, close } => (open, close),
        }
    }

    /// Pattern capturing the token name in group 1.
    pub fn pattern(&self) -> SandboxResult<Regex> {
        let (open, close) = self.delimiters();
        let pattern = format!(
            "{}([a-zA-Z_][a-zA-Z0-9_]*){}",
            regex::escape(open),
            regex::escape(close)
        );
        Regex::new(&pattern).map_err(|e| SandboxError::invalid_argument("placeholder syntax", e.to_string()))
    }

    /// Wrap `token` in this syntax's delimiters.
    pub fn wrap(&self, token: &str) -> String {
        let (open, close) = self.delimiters();
        format!("{}{}{}", open, token, close)
    }
}

impl fmt::Display for PlaceholderSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wrap("TOKEN"))
    }
}

impl FromStr for PlaceholderSyntax {
    type Err = SandboxError;

    /// Accepts `mustache`, `dollar`, or a sample such as `<%TOKEN%>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mustache" | "{{TOKEN}}" => Ok(Self::Mustache),
            "dollar" | "${TOKEN}" => Ok(Self::Dollar),
            other => match other.split_once("TOKEN") {
                Some((open, close)) => Self::custom(open, close),
                None => Err(SandboxError::invalid_argument(
                    "placeholder syntax",
                    format!("'{}' is not mustache, dollar, or a sample containing TOKEN", other),
                )),
            },
        }
    }
}

/// Runtime configuration for a setup run.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Directory (relative to the project) holding author-only assets.
    pub assets_dir: String,
    pub placeholder_syntax: PlaceholderSyntax,
    pub policy: CapabilityPolicy,
    /// Delete the assets directory after a successful run.
    pub remove_assets: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            placeholder_syntax: PlaceholderSyntax::default(),
            policy: CapabilityPolicy::javascript(),
            remove_assets: true,
        }
    }
}

impl SandboxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    pub fn with_placeholder_syntax(mut self, syntax: PlaceholderSyntax) -> Self {
        self.placeholder_syntax = syntax;
        self
    }

    pub fn with_policy(mut self, policy: CapabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn keep_assets(mut self) -> Self {
        self.remove_assets = false;
        self
    }
}
