//! Stored selection documents.
//!
//! A selection document records the tokens and input values of an earlier
//! run so a project can be regenerated. JSON, YAML and TOML are accepted,
//! chosen by file extension:
//!
//! ```yaml
//! tokens: [deployment=vercel, auth]
//! inputs:
//!   PROJECT_NAME: my-app
//!   PORT: 3000
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::commands::CommandError;

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionDocument {
    pub tokens: Vec<String>,
    pub inputs: BTreeMap<String, Value>,
}

impl SelectionDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read selection document {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let document = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => bail!(CommandError::InvalidArgument(format!(
                "selection document must be .json, .yaml, .yml or .toml: {}",
                path.display()
            ))),
        };
        Ok(document)
    }

    /// Input values as strings. Scalars are stringified; nested values are
    /// rejected.
    pub fn input_map(&self) -> Result<BTreeMap<String, String>> {
        let mut map = BTreeMap::new();
        for (name, value) in &self.inputs {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Number(_) | Value::Bool(_) => value.to_string(),
                _ => bail!(CommandError::InvalidArgument(format!(
                    "input '{}' must be a string, number or boolean",
                    name
                ))),
            };
            map.insert(name.clone(), text);
        }
        Ok(map)
    }
}

/// Parse `NAME=VALUE` pairs given on the command line.
pub fn parse_inputs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                map.insert(name.trim().to_string(), value.to_string());
            }
            _ => bail!(CommandError::InvalidArgument(format!(
                "expected NAME=VALUE, got '{}'",
                pair
            ))),
        }
    }
    Ok(map)
}
