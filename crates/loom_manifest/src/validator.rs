//! Manifest validation.
//!
//! Validation runs in two passes and stops at the first violation:
//!
//! 1. **Structural**: required fields are present and correctly typed, ids are
//!    unique and well-formed, defaults are consistent.
//! 2. **Referential**: gates, feature needs, dependency rules and placeholder
//!    references point at things the manifest declares.
//!
//! Authoring-time validation is always strict. The lenient execution-time
//! check lives in [`crate::runtime`].

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use loom_options::DimensionKind;

use crate::error::{FieldPath, ValidationError};
use crate::model::{Manifest, NeedLevel, PlaceholderType, RawManifest};

const REQUIRED_STRINGS: [&str; 3] = ["id", "name", "description"];

static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").expect("unreachable error: invalid id pattern")
});
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("unreachable error: invalid token pattern")
});

/// Strict manifest validator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestValidator;

impl ManifestValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a raw document and return the typed manifest.
    pub fn validate(&self, raw: &RawManifest) -> Result<Manifest, ValidationError> {
        let root = raw
            .as_value()
            .as_object()
            .ok_or_else(|| ValidationError::schema(FieldPath::root(), "Manifest must be an object"))?;

        check_shape(root)?;

        let manifest: Manifest = serde_json::from_value(raw.as_value().clone()).map_err(|e| {
            ValidationError::schema(
                FieldPath::root(),
                format!("Manifest does not match the expected shape: {}", e),
            )
        })?;

        check_values(&manifest)?;
        check_references(&manifest)?;

        debug!(
            "Manifest '{}' valid: {} dimension(s), {} feature(s), {} placeholder(s)",
            manifest.id,
            manifest.dimensions.len(),
            manifest.features.len(),
            manifest.placeholders.len()
        );
        Ok(manifest)
    }
}

/// Whether `id` is lower-case alphanumeric words joined by `-` or `_`.
pub fn is_valid_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}

/// Whether `token` is a valid placeholder token (identifier-like).
pub fn is_valid_token(token: &str) -> bool {
    TOKEN_PATTERN.is_match(token)
}

// ---------------------------------------------------------------------------
// Pass 1a: document shape
// ---------------------------------------------------------------------------

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_object<'a>(value: &'a Value, path: &FieldPath) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or_else(|| {
        ValidationError::schema(path.clone(), format!("Expected an object, found {}", type_name(value)))
    })
}

fn expect_array<'a>(value: &'a Value, path: &FieldPath) -> Result<&'a Vec<Value>, ValidationError> {
    value.as_array().ok_or_else(|| {
        ValidationError::schema(path.clone(), format!("Expected a list, found {}", type_name(value)))
    })
}

fn expect_string<'a>(value: &'a Value, path: &FieldPath) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or_else(|| {
        ValidationError::schema(path.clone(), format!("Expected a string, found {}", type_name(value)))
    })
}

fn require<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &FieldPath,
) -> Result<&'a Value, ValidationError> {
    map.get(key)
        .ok_or_else(|| ValidationError::schema(path.key(key), format!("Missing required field '{}'", key)))
}

/// Optional field; explicit `null` counts as absent.
fn optional<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn optional_string(map: &Map<String, Value>, key: &str, path: &FieldPath) -> Result<(), ValidationError> {
    if let Some(value) = optional(map, key) {
        expect_string(value, &path.key(key))?;
    }
    Ok(())
}

fn optional_bool(map: &Map<String, Value>, key: &str, path: &FieldPath) -> Result<(), ValidationError> {
    if let Some(value) = optional(map, key) {
        if !value.is_boolean() {
            return Err(ValidationError::schema(
                path.key(key),
                format!("Expected a boolean, found {}", type_name(value)),
            ));
        }
    }
    Ok(())
}

fn string_list(value: &Value, path: &FieldPath) -> Result<(), ValidationError> {
    for (i, item) in expect_array(value, path)?.iter().enumerate() {
        expect_string(item, &path.index(i))?;
    }
    Ok(())
}

fn optional_string_list(map: &Map<String, Value>, key: &str, path: &FieldPath) -> Result<(), ValidationError> {
    if let Some(value) = optional(map, key) {
        string_list(value, &path.key(key))?;
    }
    Ok(())
}

fn one_of(value: &str, allowed: &[&str], path: &FieldPath) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            path.clone(),
            format!("'{}' is not one of: {}", value, allowed.join(", ")),
        )
        .with_suggestion(suggest(value, allowed.iter().copied())))
    }
}

fn check_shape(root: &Map<String, Value>) -> Result<(), ValidationError> {
    let path = FieldPath::root();

    let version = require(root, "schemaVersion", &path)?;
    if !version.as_u64().is_some_and(|v| v >= 1 && v <= u64::from(u32::MAX)) {
        return Err(ValidationError::schema(
            path.key("schemaVersion"),
            "schemaVersion must be a positive integer",
        ));
    }

    for key in REQUIRED_STRINGS {
        expect_string(require(root, key, &path)?, &path.key(key))?;
    }

    let dimensions_path = path.key("dimensions");
    let dimensions = expect_object(require(root, "dimensions", &path)?, &dimensions_path)?;
    for (id, dimension) in dimensions {
        check_dimension_shape(dimension, &dimensions_path.key(id))?;
    }

    if let Some(placeholders) = optional(root, "placeholders") {
        let placeholders_path = path.key("placeholders");
        for (token, placeholder) in expect_object(placeholders, &placeholders_path)? {
            check_placeholder_shape(placeholder, &placeholders_path.key(token))?;
        }
    }

    if let Some(gates) = optional(root, "gates") {
        let gates_path = path.key("gates");
        for (dimension, options) in expect_object(gates, &gates_path)? {
            let dimension_path = gates_path.key(dimension);
            for (option, targets) in expect_object(options, &dimension_path)? {
                let option_path = dimension_path.key(option);
                for (target, allowed) in expect_object(targets, &option_path)? {
                    string_list(allowed, &option_path.key(target))?;
                }
            }
        }
    }

    if let Some(features) = optional(root, "features") {
        let features_path = path.key("features");
        for (i, feature) in expect_array(features, &features_path)?.iter().enumerate() {
            check_feature_shape(feature, &features_path.index(i))?;
        }
    }

    if let Some(setup) = optional(root, "setup") {
        let setup_path = path.key("setup");
        let setup = expect_object(setup, &setup_path)?;
        optional_string(setup, "script", &setup_path)?;
        optional_string(setup, "assetsDir", &setup_path)?;
    }

    Ok(())
}

fn check_dimension_shape(value: &Value, path: &FieldPath) -> Result<(), ValidationError> {
    let dimension = expect_object(value, path)?;

    if let Some(kind) = optional(dimension, "type") {
        one_of(expect_string(kind, &path.key("type"))?, &["single", "multi"], &path.key("type"))?;
    }
    if let Some(policy) = optional(dimension, "policy") {
        one_of(expect_string(policy, &path.key("policy"))?, &["strict", "warn"], &path.key("policy"))?;
    }
    optional_string(dimension, "label", path)?;
    optional_string(dimension, "description", path)?;
    optional_bool(dimension, "builtIn", path)?;
    optional_string_list(dimension, "placeholders", path)?;

    let options_path = path.key("options");
    let options = expect_array(require(dimension, "options", path)?, &options_path)?;
    for (i, option) in options.iter().enumerate() {
        let option_path = options_path.index(i);
        let option = expect_object(option, &option_path)?;
        expect_string(require(option, "id", &option_path)?, &option_path.key("id"))?;
        optional_string(option, "label", &option_path)?;
        optional_string(option, "description", &option_path)?;
        optional_string_list(option, "placeholders", &option_path)?;
    }

    if let Some(default) = optional(dimension, "default") {
        let default_path = path.key("default");
        match default {
            Value::String(_) => {}
            Value::Array(_) => string_list(default, &default_path)?,
            other => {
                return Err(ValidationError::schema(
                    default_path,
                    format!("Expected a string or list of strings, found {}", type_name(other)),
                ))
            }
        }
    }

    for key in ["requires", "conflicts"] {
        if let Some(rules) = optional(dimension, key) {
            let rules_path = path.key(key);
            for (value, targets) in expect_object(rules, &rules_path)? {
                string_list(targets, &rules_path.key(value))?;
            }
        }
    }

    Ok(())
}

fn check_placeholder_shape(value: &Value, path: &FieldPath) -> Result<(), ValidationError> {
    let placeholder = expect_object(value, path)?;
    expect_string(require(placeholder, "description", path)?, &path.key("description"))?;
    optional_bool(placeholder, "required", path)?;
    optional_bool(placeholder, "sensitive", path)?;
    if let Some(kind) = optional(placeholder, "type") {
        one_of(expect_string(kind, &path.key("type"))?, &PlaceholderType::NAMES, &path.key("type"))?;
    }
    if let Some(default) = optional(placeholder, "default") {
        if default.is_array() || default.is_object() {
            return Err(ValidationError::schema(
                path.key("default"),
                format!("Expected a scalar default, found {}", type_name(default)),
            ));
        }
    }
    Ok(())
}

fn check_feature_shape(value: &Value, path: &FieldPath) -> Result<(), ValidationError> {
    let feature = expect_object(value, path)?;
    expect_string(require(feature, "id", path)?, &path.key("id"))?;
    expect_string(require(feature, "label", path)?, &path.key("label"))?;
    optional_string(feature, "description", path)?;
    optional_string_list(feature, "placeholders", path)?;
    if let Some(needs) = optional(feature, "needs") {
        let needs_path = path.key("needs");
        for (dimension, level) in expect_object(needs, &needs_path)? {
            let level_path = needs_path.key(dimension);
            one_of(expect_string(level, &level_path)?, &NeedLevel::NAMES, &level_path)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pass 1b: value rules on the typed manifest
// ---------------------------------------------------------------------------

fn check_values(manifest: &Manifest) -> Result<(), ValidationError> {
    let root = FieldPath::root();

    if !is_valid_id(&manifest.id) {
        return Err(ValidationError::invalid(
            root.key("id"),
            format!("Template id '{}' must be lower-case words joined by '-' or '_'", manifest.id),
        ));
    }

    if manifest.dimensions.is_empty() {
        return Err(ValidationError::invalid(
            root.key("dimensions"),
            "A manifest must declare at least one dimension",
        ));
    }

    for (id, dimension) in &manifest.dimensions {
        let path = root.key("dimensions").key(id);
        if !is_valid_id(id) {
            return Err(ValidationError::invalid(
                path,
                format!("Dimension id '{}' must be lower-case words joined by '-' or '_'", id),
            ));
        }
        if dimension.options.is_empty() {
            return Err(ValidationError::invalid(
                path.key("options"),
                format!("Dimension '{}' must declare at least one option", id),
            ));
        }

        let mut seen = HashSet::new();
        for (i, option) in dimension.options.iter().enumerate() {
            let option_path = path.key("options").index(i).key("id");
            if !is_valid_id(&option.id) {
                return Err(ValidationError::invalid(
                    option_path,
                    format!("Option id '{}' must be lower-case words joined by '-' or '_'", option.id),
                ));
            }
            if !seen.insert(option.id.as_str()) {
                return Err(ValidationError::invalid(
                    option_path,
                    format!("Duplicate option id '{}' in dimension '{}'", option.id, id),
                ));
            }
        }

        if let Some(default) = &dimension.default {
            let values = default.values();
            if dimension.kind == DimensionKind::Single && matches!(default, loom_options::DefaultValue::Many(_)) {
                return Err(ValidationError::invalid(
                    path.key("default"),
                    format!("Single-valued dimension '{}' needs a single default value", id),
                ));
            }
            for value in values {
                if dimension.option(value).is_none() {
                    return Err(ValidationError::invalid(
                        path.key("default"),
                        format!("Default '{}' is not an option of dimension '{}'", value, id),
                    )
                    .with_suggestion(suggest(value, dimension.option_ids())));
                }
            }
        }

        for (key, rules) in [("requires", &dimension.requires), ("conflicts", &dimension.conflicts)] {
            for value in rules.keys() {
                if dimension.option(value).is_none() {
                    return Err(ValidationError::invalid(
                        path.key(key).key(value),
                        format!("'{}' is not an option of dimension '{}'", value, id),
                    )
                    .with_suggestion(suggest(value, dimension.option_ids())));
                }
            }
        }
    }

    for (token, placeholder) in &manifest.placeholders {
        let path = root.key("placeholders").key(token);
        if !is_valid_token(token) {
            return Err(ValidationError::invalid(
                path,
                format!("Placeholder token '{}' must be an identifier", token),
            ));
        }
        if placeholder.description.trim().is_empty() {
            return Err(ValidationError::invalid(
                path.key("description"),
                format!("Placeholder '{}' needs a description", token),
            ));
        }
        if let Some(default) = &placeholder.default {
            check_default_type(placeholder.value_type, default, &path.key("default"))?;
        }
    }

    let mut feature_ids = HashSet::new();
    for (i, feature) in manifest.features.iter().enumerate() {
        let path = root.key("features").index(i).key("id");
        if !is_valid_id(&feature.id) {
            return Err(ValidationError::invalid(
                path,
                format!("Feature id '{}' must be lower-case words joined by '-' or '_'", feature.id),
            ));
        }
        if !feature_ids.insert(feature.id.as_str()) {
            return Err(ValidationError::invalid(
                path,
                format!("Duplicate feature id '{}'", feature.id),
            ));
        }
    }

    Ok(())
}

fn check_default_type(kind: PlaceholderType, default: &Value, path: &FieldPath) -> Result<(), ValidationError> {
    let consistent = match (kind, default) {
        (_, Value::Null) => true,
        (PlaceholderType::Number, Value::Number(_)) => true,
        (PlaceholderType::Number, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
        (PlaceholderType::Boolean, Value::Bool(_)) => true,
        (PlaceholderType::Boolean, Value::String(s)) => matches!(s.as_str(), "true" | "false"),
        (PlaceholderType::Text | PlaceholderType::Password, Value::String(_)) => true,
        (PlaceholderType::Email, Value::String(s)) => crate::inputs::looks_like_email(s),
        (PlaceholderType::Url, Value::String(s)) => crate::inputs::looks_like_url(s),
        _ => false,
    };
    if consistent {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            path.clone(),
            format!("Default {} is not a valid {} value", default, kind.name()),
        ))
    }
}

// ---------------------------------------------------------------------------
// Pass 2: references
// ---------------------------------------------------------------------------

fn check_references(manifest: &Manifest) -> Result<(), ValidationError> {
    let root = FieldPath::root();
    let dimension_ids = || manifest.dimensions.keys().map(String::as_str);

    for (dimension_id, options) in &manifest.gates {
        let path = root.key("gates").key(dimension_id);
        let dimension = manifest.dimensions.get(dimension_id).ok_or_else(|| {
            ValidationError::domain(path.clone(), format!("Gate on unknown dimension '{}'", dimension_id))
                .with_suggestion(suggest(dimension_id, dimension_ids()))
        })?;

        for (option_id, targets) in options {
            let option_path = path.key(option_id);
            if dimension.option(option_id).is_none() {
                return Err(ValidationError::domain(
                    option_path,
                    format!("Gate on unknown option '{}' of dimension '{}'", option_id, dimension_id),
                )
                .with_suggestion(suggest(option_id, dimension.option_ids())));
            }

            for (target_id, allowed) in targets {
                let target_path = option_path.key(target_id);
                let target = manifest.dimensions.get(target_id).ok_or_else(|| {
                    ValidationError::domain(
                        target_path.clone(),
                        format!("Gate targets unknown dimension '{}'", target_id),
                    )
                    .with_suggestion(suggest(target_id, dimension_ids()))
                })?;
                for (i, allowed_id) in allowed.iter().enumerate() {
                    if target.option(allowed_id).is_none() {
                        return Err(ValidationError::domain(
                            target_path.index(i),
                            format!("Gate allows unknown option '{}' of dimension '{}'", allowed_id, target_id),
                        )
                        .with_suggestion(suggest(allowed_id, target.option_ids())));
                    }
                }
            }
        }
    }

    for (i, feature) in manifest.features.iter().enumerate() {
        let path = root.key("features").index(i);
        for dimension_id in feature.needs.keys() {
            if !manifest.dimensions.contains_key(dimension_id) {
                return Err(ValidationError::domain(
                    path.key("needs").key(dimension_id),
                    format!("Feature '{}' needs unknown dimension '{}'", feature.id, dimension_id),
                )
                .with_suggestion(suggest(dimension_id, dimension_ids())));
            }
        }
        check_placeholder_refs(manifest, &feature.placeholders, &path.key("placeholders"))?;
    }

    let all_options: Vec<&str> = manifest
        .dimensions
        .values()
        .flat_map(|d| d.option_ids())
        .collect();

    for (id, dimension) in &manifest.dimensions {
        let path = root.key("dimensions").key(id);
        for (key, rules) in [("requires", &dimension.requires), ("conflicts", &dimension.conflicts)] {
            for (value, targets) in rules {
                for (i, target) in targets.iter().enumerate() {
                    if !all_options.contains(&target.as_str()) {
                        return Err(ValidationError::domain(
                            path.key(key).key(value).index(i),
                            format!("'{}' is not an option of any dimension", target),
                        )
                        .with_suggestion(suggest(target, all_options.iter().copied())));
                    }
                }
            }
        }

        check_placeholder_refs(manifest, &dimension.placeholders, &path.key("placeholders"))?;
        for (i, option) in dimension.options.iter().enumerate() {
            check_placeholder_refs(
                manifest,
                &option.placeholders,
                &path.key("options").index(i).key("placeholders"),
            )?;
        }
    }

    Ok(())
}

fn check_placeholder_refs(manifest: &Manifest, refs: &[String], path: &FieldPath) -> Result<(), ValidationError> {
    for (i, token) in refs.iter().enumerate() {
        if !manifest.placeholders.contains_key(token) {
            return Err(ValidationError::domain(
                path.index(i),
                format!("Unknown placeholder '{}'", token),
            )
            .with_suggestion(suggest(token, manifest.placeholders.keys().map(String::as_str))));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Suggest the closest candidate within an edit distance of two.
fn suggest<'a>(value: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates
        .into_iter()
        .map(|c| (edit_distance(value, c), c))
        .filter(|(d, _)| *d <= 2)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| format!("did you mean `{}`?", c))
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j] + cost)
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_id() {
        assert!(is_valid_id("auth"));
        assert!(is_valid_id("web-starter_2"));
        assert!(!is_valid_id("Auth"));
        assert!(!is_valid_id("-auth"));
        assert!(!is_valid_id("a--b"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("auth\n"));
    }

    #[test]
    fn test_is_valid_token() {
        assert!(is_valid_token("PROJECT_NAME"));
        assert!(is_valid_token("_private"));
        assert!(!is_valid_token("1ST"));
        assert!(!is_valid_token("with-dash"));
    }

    #[test]
    fn test_edit_distance_and_suggest() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(
            suggest("databse", ["database", "deployment"]),
            Some("did you mean `database`?".to_string())
        );
        assert_eq!(suggest("zzz", ["database"]), None);
    }
}
