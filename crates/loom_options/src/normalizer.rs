//! Option normalization.
//!
//! Turns raw selection tokens into a [`ResolvedSelection`]:
//!
//! - `dim=v1+v2` assigns values to `dim`
//! - a bare token goes to the catch-all dimension (see [`DimensionSet::catch_all`])
//! - unknown dimensions and values are soft failures (collected or warned)
//! - malformed tokens and `requires`/`conflicts` violations are hard errors
//!
//! The result is deterministic: multi-valued entries are deduplicated and
//! sorted, so the same tokens always produce the same selection.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::error::{OptionsError, OptionsResult};
use crate::schema::{DefaultValue, Dimension, DimensionSet, ValuePolicy};
use crate::selection::{ResolvedSelection, SelectionValue};

/// Normalize raw tokens against a dimension set.
pub fn normalize<S: AsRef<str>>(
    raw_tokens: &[S],
    dimensions: &DimensionSet,
) -> OptionsResult<ResolvedSelection> {
    OptionNormalizer::new(dimensions).normalize(raw_tokens)
}

/// Working value of a dimension while tokens are applied.
#[derive(Debug)]
enum Slot {
    Single(Option<String>),
    Multi {
        values: BTreeSet<String>,
        /// Set once a token assigns this dimension; the first accepted value
        /// replaces the declared default instead of adding to it.
        explicit: bool,
    },
}

impl Slot {
    fn from_default(dimension: &Dimension) -> Self {
        let defaults = dimension.default.as_ref().map(DefaultValue::values);
        if dimension.is_multi() {
            Slot::Multi {
                values: defaults
                    .unwrap_or_default()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                explicit: false,
            }
        } else {
            Slot::Single(
                defaults
                    .and_then(|v| v.first().copied())
                    .map(str::to_string),
            )
        }
    }

    fn accept(&mut self, value: String) {
        match self {
            Slot::Single(current) => *current = Some(value),
            Slot::Multi { values, explicit } => {
                if !*explicit {
                    values.clear();
                    *explicit = true;
                }
                values.insert(value);
            }
        }
    }

    fn into_value(self) -> SelectionValue {
        match self {
            Slot::Single(value) => SelectionValue::Single(value),
            Slot::Multi { values, .. } => SelectionValue::Multi(values.into_iter().collect()),
        }
    }
}

/// Stateless normalizer bound to one dimension set.
pub struct OptionNormalizer<'a> {
    dimensions: &'a DimensionSet,
}

impl<'a> OptionNormalizer<'a> {
    pub fn new(dimensions: &'a DimensionSet) -> Self {
        Self { dimensions }
    }

    /// Apply `raw_tokens` on top of the declared defaults.
    pub fn normalize<S: AsRef<str>>(&self, raw_tokens: &[S]) -> OptionsResult<ResolvedSelection> {
        let mut slots: BTreeMap<String, Slot> = self
            .dimensions
            .iter()
            .map(|d| (d.id.clone(), Slot::from_default(d)))
            .collect();
        let mut selection = ResolvedSelection::default();

        for raw in raw_tokens {
            let token = raw.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            selection.tokens.push(token.to_string());
            self.apply_token(token, &mut slots, &mut selection)?;
        }

        selection.by_dimension = slots
            .into_iter()
            .map(|(id, slot)| (id, slot.into_value()))
            .collect();

        self.check_dependencies(&selection)?;

        debug!(
            "Normalized {} token(s): {} warning(s), {} unknown",
            selection.tokens.len(),
            selection.warnings.len(),
            selection.unknown.len()
        );
        Ok(selection)
    }

    fn apply_token(
        &self,
        token: &str,
        slots: &mut BTreeMap<String, Slot>,
        selection: &mut ResolvedSelection,
    ) -> OptionsResult<()> {
        match token.split_once('=') {
            Some((name, list)) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(OptionsError::EmptyDimensionName {
                        token: token.to_string(),
                    });
                }
                let values = split_values(list);
                if values.is_empty() {
                    return Err(OptionsError::EmptyAssignment {
                        token: token.to_string(),
                    });
                }
                match self.dimensions.get(name) {
                    Some(dimension) => self.assign(dimension, values, token, true, slots, selection),
                    None => {
                        debug!("Unknown dimension in token '{}'", token);
                        selection.unknown.push(token.to_string());
                        Ok(())
                    }
                }
            }
            None => {
                let values = split_values(token);
                match self.dimensions.catch_all() {
                    Some(dimension) => {
                        self.assign(dimension, values, token, false, slots, selection)
                    }
                    None => {
                        debug!("No catch-all dimension for bare token '{}'", token);
                        selection.unknown.push(token.to_string());
                        Ok(())
                    }
                }
            }
        }
    }

    fn assign(
        &self,
        dimension: &Dimension,
        values: Vec<String>,
        token: &str,
        qualified: bool,
        slots: &mut BTreeMap<String, Slot>,
        selection: &mut ResolvedSelection,
    ) -> OptionsResult<()> {
        if !dimension.is_multi() && values.len() > 1 {
            return Err(OptionsError::Arity {
                dimension: dimension.id.clone(),
                token: token.to_string(),
                count: values.len(),
            });
        }

        let slot = match slots.get_mut(&dimension.id) {
            Some(slot) => slot,
            None => return Ok(()),
        };

        for value in values {
            if dimension.allows(&value) {
                slot.accept(value);
                continue;
            }
            match dimension.policy {
                ValuePolicy::Strict => {
                    let entry = if qualified {
                        format!("{}={}", dimension.id, value)
                    } else {
                        value
                    };
                    debug!("Dropping unknown value '{}'", entry);
                    selection.unknown.push(entry);
                }
                ValuePolicy::Warn => {
                    let message = format!(
                        "Unknown value '{}' for dimension '{}' (allowed: {})",
                        value,
                        dimension.id,
                        dimension.allowed_values.join(", ")
                    );
                    warn!("{}", message);
                    selection.warnings.push(message);
                    slot.accept(value);
                }
            }
        }
        Ok(())
    }

    /// Enforce `requires` and `conflicts` against the flattened selection.
    fn check_dependencies(&self, selection: &ResolvedSelection) -> OptionsResult<()> {
        let selected = selection.all_values();

        for dimension in self.dimensions.iter() {
            let mut chosen = selection.values_of(&dimension.id);
            chosen.sort_unstable();

            for value in chosen {
                if let Some(required) = dimension.requires.get(value) {
                    if let Some(missing) = required.iter().find(|r| !selected.contains(r.as_str())) {
                        return Err(OptionsError::MissingDependency {
                            dimension: dimension.id.clone(),
                            value: value.to_string(),
                            missing: missing.clone(),
                        });
                    }
                }
                if let Some(excluded) = dimension.conflicts.get(value) {
                    if let Some(conflicting) =
                        excluded.iter().find(|c| selected.contains(c.as_str()))
                    {
                        return Err(OptionsError::Conflict {
                            dimension: dimension.id.clone(),
                            value: value.to_string(),
                            conflicting: conflicting.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Split a `+`-joined value list, trimming segments and dropping empty ones.
fn split_values(list: &str) -> Vec<String> {
    list.split('+')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> DimensionSet {
        DimensionSet::new(vec![
            Dimension::single("deployment", ["vercel", "cloudflare"]).with_default("vercel"),
            Dimension::single("auth", ["jwt", "session"]).requires("jwt", ["ssl"]),
            Dimension::multi("features", ["a", "m", "z", "ssl"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_split_values() {
        assert_eq!(split_values(" a + +b+ "), vec!["a", "b"]);
        assert!(split_values("++").is_empty());
    }

    #[test]
    fn test_defaults_applied() {
        let selection = normalize::<&str>(&[], &dims()).unwrap();
        assert_eq!(
            selection.get("deployment"),
            Some(&SelectionValue::Single(Some("vercel".into())))
        );
        assert_eq!(selection.get("auth"), Some(&SelectionValue::Single(None)));
        assert_eq!(selection.get("features"), Some(&SelectionValue::Multi(vec![])));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let selection = normalize(&["  deployment =  cloudflare "], &dims()).unwrap();
        assert!(selection.has_in("deployment", "cloudflare"));
        assert_eq!(selection.tokens, vec!["deployment =  cloudflare"]);
    }

    #[test]
    fn test_empty_assignment_is_fatal() {
        let err = normalize(&["auth="], &dims()).unwrap_err();
        assert!(matches!(err, OptionsError::EmptyAssignment { .. }));
        let err = normalize(&["auth=+ +"], &dims()).unwrap_err();
        assert!(matches!(err, OptionsError::EmptyAssignment { .. }));
    }

    #[test]
    fn test_single_arity_is_fatal() {
        let err = normalize(&["deployment=vercel+cloudflare"], &dims()).unwrap_err();
        assert_eq!(
            err,
            OptionsError::Arity {
                dimension: "deployment".into(),
                token: "deployment=vercel+cloudflare".into(),
                count: 2
            }
        );
    }

    #[test]
    fn test_bare_tokens_go_to_catch_all() {
        let selection = normalize(&["z", "a+m"], &dims()).unwrap();
        assert_eq!(selection.values_of("features"), vec!["a", "m", "z"]);
    }

    #[test]
    fn test_bare_token_without_catch_all_is_unknown() {
        let set = DimensionSet::new(vec![Dimension::single("db", ["pg"])]).unwrap();
        let selection = normalize(&["pg"], &set).unwrap();
        assert_eq!(selection.unknown, vec!["pg"]);
        assert_eq!(selection.get("db"), Some(&SelectionValue::Single(None)));
    }

    #[test]
    fn test_unknown_dimension_is_collected() {
        let selection = normalize(&["color=red"], &dims()).unwrap();
        assert_eq!(selection.unknown, vec!["color=red"]);
        assert!(selection.warnings.is_empty());
    }

    #[test]
    fn test_conflict_is_fatal() {
        let set = DimensionSet::new(vec![
            Dimension::single("db", ["sqlite", "pg"]).conflicts("sqlite", ["cloudflare"]),
            Dimension::single("deployment", ["vercel", "cloudflare"]),
        ])
        .unwrap();
        let err = normalize(&["db=sqlite", "deployment=cloudflare"], &set).unwrap_err();
        assert_eq!(
            err,
            OptionsError::Conflict {
                dimension: "db".into(),
                value: "sqlite".into(),
                conflicting: "cloudflare".into()
            }
        );
        assert!(err.is_dependency_error());
    }

    #[test]
    fn test_explicit_multi_replaces_default() {
        let set = DimensionSet::new(vec![
            Dimension::multi("features", ["a", "b", "c"]).with_defaults(["a"]),
        ])
        .unwrap();
        let selection = normalize(&["features=c", "b"], &set).unwrap();
        assert_eq!(selection.values_of("features"), vec!["b", "c"]);
    }
}
