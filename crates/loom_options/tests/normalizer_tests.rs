//! Integration tests for option normalization.

use loom_options::{
    normalize, Dimension, DimensionSet, OptionsError, SelectionValue, ValuePolicy,
};
use proptest::prelude::*;

fn auth_dimensions(policy: ValuePolicy) -> DimensionSet {
    DimensionSet::new(vec![
        Dimension::single("auth", ["jwt", "session"])
            .requires("jwt", ["ssl"])
            .with_policy(policy),
        Dimension::multi("features", ["ssl", "a", "m", "z"]),
        Dimension::single("region", ["eu", "us"]).with_default("eu"),
    ])
    .unwrap()
}

#[test]
fn test_empty_selection_uses_null_and_empty_list() {
    let selection = normalize::<&str>(&[], &auth_dimensions(ValuePolicy::Strict)).unwrap();

    assert_eq!(selection.get("auth"), Some(&SelectionValue::Single(None)));
    assert_eq!(selection.get("features"), Some(&SelectionValue::Multi(Vec::new())));
    assert_eq!(
        selection.get("region"),
        Some(&SelectionValue::Single(Some("eu".into())))
    );
    assert!(selection.is_clean());
}

#[test]
fn test_multi_values_sorted_and_deduplicated() {
    let tokens = ["features=z", "features=a", "features=m", "features=a+z"];
    let selection = normalize(&tokens, &auth_dimensions(ValuePolicy::Strict)).unwrap();
    assert_eq!(
        selection.get("features"),
        Some(&SelectionValue::Multi(vec!["a".into(), "m".into(), "z".into()]))
    );
}

#[test]
fn test_missing_requirement_names_dimension_value_and_dependency() {
    let err = normalize(&["auth=jwt"], &auth_dimensions(ValuePolicy::Strict)).unwrap_err();
    assert_eq!(
        err,
        OptionsError::MissingDependency {
            dimension: "auth".into(),
            value: "jwt".into(),
            missing: "ssl".into(),
        }
    );
    let message = err.to_string();
    assert!(message.contains("auth"));
    assert!(message.contains("jwt"));
    assert!(message.contains("ssl"));
}

#[test]
fn test_requirement_satisfied_from_another_dimension() {
    let selection =
        normalize(&["auth=jwt", "features=ssl"], &auth_dimensions(ValuePolicy::Strict)).unwrap();
    assert!(selection.has_in("auth", "jwt"));
}

#[test]
fn test_strict_policy_collects_unknown_value() {
    let selection =
        normalize(&["auth=invalid"], &auth_dimensions(ValuePolicy::Strict)).unwrap();
    assert_eq!(selection.unknown, vec!["auth=invalid"]);
    assert!(selection.warnings.is_empty());
    assert_eq!(selection.get("auth"), Some(&SelectionValue::Single(None)));
}

#[test]
fn test_warn_policy_keeps_value_and_warns() {
    let selection = normalize(&["auth=invalid"], &auth_dimensions(ValuePolicy::Warn)).unwrap();
    assert!(selection.unknown.is_empty());
    assert_eq!(selection.warnings.len(), 1);
    assert!(selection.warnings[0].contains("invalid"));
    assert!(selection.has_in("auth", "invalid"));
}

#[test]
fn test_dependency_errors_ignore_warn_policy() {
    let err = normalize(&["auth=jwt"], &auth_dimensions(ValuePolicy::Warn)).unwrap_err();
    assert!(err.is_dependency_error());
}

fn feature_token() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "m", "z", "ssl", "bogus"]), 1..4)
        .prop_map(|values| format!("features={}", values.join("+")))
}

proptest! {
    #[test]
    fn prop_normalize_is_deterministic(tokens in prop::collection::vec(feature_token(), 0..8)) {
        let dims = auth_dimensions(ValuePolicy::Strict);
        let first = normalize(&tokens, &dims).unwrap();
        let second = normalize(&tokens, &dims).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_multi_values_are_sorted_and_unique(tokens in prop::collection::vec(feature_token(), 0..8)) {
        let selection = normalize(&tokens, &auth_dimensions(ValuePolicy::Strict)).unwrap();
        let values = selection.values_of("features");
        let mut expected = values.clone();
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(values, expected);
    }

    #[test]
    fn prop_token_order_does_not_matter(mut tokens in prop::collection::vec(feature_token(), 1..6)) {
        let dims = auth_dimensions(ValuePolicy::Strict);
        let forward = normalize(&tokens, &dims).unwrap();
        tokens.reverse();
        let backward = normalize(&tokens, &dims).unwrap();
        prop_assert_eq!(forward.by_dimension, backward.by_dimension);
    }
}
