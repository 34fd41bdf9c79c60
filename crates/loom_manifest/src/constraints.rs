//! Gate and feature-need evaluation against a resolved selection.

use serde::Serialize;

use loom_options::ResolvedSelection;

use crate::model::{Manifest, NeedLevel};

/// Which rule a [`ConstraintViolation`] broke.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Gate,
    FeatureNeed,
}

/// A selection that breaks a gate or a feature's required need.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub kind: ConstraintKind,
    /// Dimension (for gates) or feature id (for needs) that owns the rule.
    pub source: String,
    /// Option that triggered the rule.
    pub trigger: String,
    /// Dimension whose selection is restricted or required.
    pub target: String,
    pub message: String,
}

/// Evaluates manifest-level constraints that span dimensions.
pub struct ConstraintCheck;

impl ConstraintCheck {
    /// Collect every gate and feature-need violation of `selection`.
    pub fn evaluate(manifest: &Manifest, selection: &ResolvedSelection) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for (dimension_id, options) in &manifest.gates {
            for (option_id, targets) in options {
                if !selection.has_in(dimension_id, option_id) {
                    continue;
                }
                for (target_id, allowed) in targets {
                    for chosen in selection.values_of(target_id) {
                        if !allowed.iter().any(|a| a == chosen) {
                            violations.push(ConstraintViolation {
                                kind: ConstraintKind::Gate,
                                source: dimension_id.clone(),
                                trigger: option_id.clone(),
                                target: target_id.clone(),
                                message: format!(
                                    "{}={} only allows {} to be one of [{}], but '{}' is selected",
                                    dimension_id,
                                    option_id,
                                    target_id,
                                    allowed.join(", "),
                                    chosen
                                ),
                            });
                        }
                    }
                }
            }
        }

        let catch_all = manifest.catch_all_dimension();
        for feature in &manifest.features {
            if !catch_all.is_some_and(|dimension| selection.has_in(dimension, &feature.id)) {
                continue;
            }
            for (dimension_id, level) in &feature.needs {
                if *level == NeedLevel::Required && selection.values_of(dimension_id).is_empty() {
                    violations.push(ConstraintViolation {
                        kind: ConstraintKind::FeatureNeed,
                        source: feature.id.clone(),
                        trigger: feature.id.clone(),
                        target: dimension_id.clone(),
                        message: format!(
                            "Feature '{}' requires a selection for '{}'",
                            feature.label, dimension_id
                        ),
                    });
                }
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawManifest;
    use crate::validator::ManifestValidator;
    use loom_options::normalize;

    fn manifest() -> Manifest {
        let raw = RawManifest::from_yaml_str(
            r#"
schemaVersion: 1
id: web
name: Web
description: Web starter
dimensions:
  deployment:
    options: [{ id: vercel }, { id: cloudflare }]
    default: vercel
  database:
    options: [{ id: d1 }, { id: postgres }, { id: none }]
  features:
    type: multi
    options: [{ id: auth }, { id: blog }]
gates:
  deployment:
    cloudflare: { database: [d1, none] }
features:
  - id: auth
    label: Authentication
    needs: { database: required }
"#,
        )
        .unwrap();
        ManifestValidator::new().validate(&raw).unwrap()
    }

    #[test]
    fn test_gate_violation() {
        let manifest = manifest();
        let dims = manifest.dimension_set().unwrap();
        let selection = normalize(&["deployment=cloudflare", "database=postgres"], &dims).unwrap();

        let violations = ConstraintCheck::evaluate(&manifest, &selection);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ConstraintKind::Gate);
        assert_eq!(violations[0].target, "database");
    }

    #[test]
    fn test_gate_passes_for_allowed_or_unset_target() {
        let manifest = manifest();
        let dims = manifest.dimension_set().unwrap();
        for tokens in [vec!["deployment=cloudflare", "database=d1"], vec!["deployment=cloudflare"]] {
            let selection = normalize(&tokens, &dims).unwrap();
            assert!(ConstraintCheck::evaluate(&manifest, &selection).is_empty());
        }
    }

    #[test]
    fn test_required_feature_need() {
        let manifest = manifest();
        let dims = manifest.dimension_set().unwrap();

        let selection = normalize(&["auth"], &dims).unwrap();
        let violations = ConstraintCheck::evaluate(&manifest, &selection);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ConstraintKind::FeatureNeed);

        let selection = normalize(&["auth", "database=postgres"], &dims).unwrap();
        assert!(ConstraintCheck::evaluate(&manifest, &selection).is_empty());
    }
    #[test]
    fn test_feature_only_switched_on_by_catch_all_dimension() {
        let raw = RawManifest::from_yaml_str(
            r#"
schemaVersion: 1
id: api
name: API
description: API starter
dimensions:
  login:
    options: [{ id: auth }, { id: anonymous }]
  database:
    options: [{ id: postgres }, { id: sqlite }]
  addons:
    type: multi
    options: [{ id: auth }, { id: metrics }]
features:
  - id: auth
    label: Authentication
    needs: { database: required }
"#,
        )
        .unwrap();
        let manifest = ManifestValidator::new().validate(&raw).unwrap();
        assert_eq!(manifest.catch_all_dimension(), Some("addons"));
        let dims = manifest.dimension_set().unwrap();

        let selection = normalize(&["login=auth"], &dims).unwrap();
        assert!(ConstraintCheck::evaluate(&manifest, &selection).is_empty());

        let selection = normalize(&["addons=auth"], &dims).unwrap();
        let violations = ConstraintCheck::evaluate(&manifest, &selection);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].target, "database");
    }
}
