//! Placeholder input resolution.
//!
//! Combines user-provided values with placeholder defaults, checks required
//! placeholders and validates values against their declared type.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use indexmap::IndexMap;
use tracing::warn;
use url::Url;

use crate::error::{ManifestError, ManifestResult};
use crate::model::{Placeholder, PlaceholderType};

const REDACTED: &str = "********";

/// Resolved placeholder values for one run.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct InputValues {
    values: BTreeMap<String, String>,
    sensitive: BTreeSet<String>,
}

impl InputValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn mark_sensitive(&mut self, name: impl Into<String>) {
        self.sensitive.insert(name.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.sensitive.contains(name)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for InputValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.values {
            if self.sensitive.contains(name) {
                map.entry(name, &REDACTED);
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

impl FromIterator<(String, String)> for InputValues {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
            sensitive: BTreeSet::new(),
        }
    }
}

/// Outcome of [`resolve_inputs`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedInputs {
    pub values: InputValues,
    pub warnings: Vec<String>,
}

/// Resolve placeholder values from provided inputs and declared defaults.
pub fn resolve_inputs(
    placeholders: &IndexMap<String, Placeholder>,
    provided: &BTreeMap<String, String>,
) -> ManifestResult<ResolvedInputs> {
    let mut resolved = ResolvedInputs::default();

    for (token, placeholder) in placeholders {
        let value = match provided.get(token) {
            Some(value) => Some(value.clone()),
            None => placeholder.default_text(),
        };

        let value = match value {
            Some(value) => value,
            None if placeholder.required => {
                return Err(ManifestError::MissingInput(token.clone()));
            }
            None => continue,
        };

        check_value(placeholder.value_type, &value).map_err(|message| ManifestError::InvalidInput {
            input: token.clone(),
            message,
        })?;

        if placeholder.sensitive || placeholder.value_type == PlaceholderType::Password {
            resolved.values.mark_sensitive(token.clone());
        }
        resolved.values.insert(token.clone(), value);
    }

    for name in provided.keys().filter(|name| !placeholders.contains_key(*name)) {
        let message = format!("Input '{}' does not match any declared placeholder", name);
        warn!("{}", message);
        resolved.warnings.push(message);
    }

    Ok(resolved)
}

fn check_value(kind: PlaceholderType, value: &str) -> Result<(), String> {
    let ok = match kind {
        PlaceholderType::Text | PlaceholderType::Password => true,
        PlaceholderType::Number => value.trim().parse::<f64>().is_ok(),
        PlaceholderType::Boolean => matches!(value, "true" | "false"),
        PlaceholderType::Email => looks_like_email(value),
        PlaceholderType::Url => looks_like_url(value),
    };
    if ok {
        Ok(())
    } else {
        Err(format!("expected a {} value", kind.name()))
    }
}

/// Loose `local@domain.tld` check.
pub fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain.contains('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Absolute URL with a host, e.g. `https://example.com/path`.
pub fn looks_like_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| url.host_str().is_some_and(|host| !host.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders() -> IndexMap<String, Placeholder> {
        serde_yaml::from_str(
            r#"
PROJECT_NAME: { description: Name, default: my-app, required: true }
PORT: { description: Port, default: 3000, type: number }
ADMIN_EMAIL: { description: Admin, type: email }
API_TOKEN: { description: Token, required: true, sensitive: true }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_and_provided_values() {
        let provided = BTreeMap::from([("API_TOKEN".to_string(), "secret".to_string())]);
        let resolved = resolve_inputs(&placeholders(), &provided).unwrap();
        assert_eq!(resolved.values.get("PROJECT_NAME"), Some("my-app"));
        assert_eq!(resolved.values.get("PORT"), Some("3000"));
        assert_eq!(resolved.values.get("ADMIN_EMAIL"), None);
        assert!(resolved.values.is_sensitive("API_TOKEN"));
    }

    #[test]
    fn test_missing_required_input() {
        let err = resolve_inputs(&placeholders(), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, ManifestError::MissingInput(name) if name == "API_TOKEN"));
    }

    #[test]
    fn test_type_checked_values() {
        let provided = BTreeMap::from([
            ("API_TOKEN".to_string(), "t".to_string()),
            ("PORT".to_string(), "eighty".to_string()),
        ]);
        let err = resolve_inputs(&placeholders(), &provided).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidInput { input, .. } if input == "PORT"));
    }

    #[test]
    fn test_unknown_inputs_warn() {
        let provided = BTreeMap::from([
            ("API_TOKEN".to_string(), "t".to_string()),
            ("EXTRA".to_string(), "x".to_string()),
        ]);
        let resolved = resolve_inputs(&placeholders(), &provided).unwrap();
        assert_eq!(resolved.warnings.len(), 1);
        assert_eq!(resolved.values.get("EXTRA"), None);
    }

    #[test]
    fn test_debug_redacts_sensitive_values() {
        let provided = BTreeMap::from([("API_TOKEN".to_string(), "hunter2".to_string())]);
        let resolved = resolve_inputs(&placeholders(), &provided).unwrap();
        let rendered = format!("{:?}", resolved.values);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("my-app"));
    }

    #[test]
    fn test_format_checks() {
        assert!(looks_like_email("dev@example.com"));
        assert!(!looks_like_email("dev@localhost"));
        assert!(!looks_like_email("@example.com"));
        assert!(looks_like_url("https://example.com/path"));
        assert!(!looks_like_url("example.com"));
        assert!(looks_like_url("postgres://db.internal:5432/app"));
        assert!(!looks_like_url("https://"));
        assert!(!looks_like_url("mailto:dev@example.com"));
        assert!(!looks_like_url("http://exa mple.com"));
    }
}
