// SPDX-License-Identifier: MIT OR Apache-2.0
//! Source-to-flat expansion.

use crate::applicability::filter_behaviors;
use ctl_core::{
    ConflictSet, ExpectedPayload, FeatureId, FlatValidation, FunctionId, TestCase, TestShape,
    ValidationSlot,
};
use tracing::debug;

/// Expand a source test into one flat test per present validation slot.
///
/// Output follows canonical validation order. Flat tests, and source tests
/// with no slots, come back unchanged as a single-element vector.
#[must_use]
pub fn expand(test: &TestCase) -> Vec<TestCase> {
    let TestShape::Source(validations) = &test.shape else {
        return vec![test.clone()];
    };
    if validations.is_empty() {
        return vec![test.clone()];
    }

    let derived: Vec<TestCase> = validations
        .iter()
        .map(|(validation, slot)| derive(test, validation, slot))
        .collect();
    debug!(
        target: "ctl.transform",
        test = %test.name,
        derived = derived.len(),
        "expanded source test"
    );
    derived
}

/// [`expand`] over a collection, concatenated in input order.
#[must_use]
pub fn expand_all(tests: &[TestCase]) -> Vec<TestCase> {
    tests.iter().flat_map(expand).collect()
}

fn derive(source: &TestCase, validation: &FunctionId, slot: &ValidationSlot) -> TestCase {
    let known = validation.known();
    let typed = known.is_some_and(|f| f.is_typed_accessor());
    if !typed && !slot.args.is_empty() {
        debug!(
            target: "ctl.transform",
            test = %source.name,
            %validation,
            "dropping args on a validation that takes none"
        );
    }

    let mut features: Vec<FeatureId> = Vec::with_capacity(source.features.len() + 1);
    let implied = known
        .map(|f| f.implied_features())
        .unwrap_or_default()
        .iter()
        .map(|f| FeatureId::from(*f));
    for feature in source.features.iter().cloned().chain(implied) {
        if !features.contains(&feature) {
            features.push(feature);
        }
    }

    let conflicts = source.conflicts.as_ref().and_then(|c| {
        ConflictSet {
            behaviors: filter_behaviors(&c.behaviors, validation),
            ..c.clone()
        }
        .normalize()
    });

    TestCase {
        name: format!("{}_{}", source.name, validation),
        inputs: source.inputs.clone(),
        shape: TestShape::Flat(FlatValidation {
            validation: validation.clone(),
            expected: ExpectedPayload::shape(validation, slot.expected.clone()),
            args: if typed { slot.args.clone() } else { Vec::new() },
            expect_error: slot.expect_error,
            functions: vec![validation.clone()],
            source_test: Some(source.name.clone()),
        }),
        features,
        behaviors: filter_behaviors(&source.behaviors, validation),
        variants: source.variants.clone(),
        conflicts,
        level: source.level,
        tags: source.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctl_core::Entry;
    use serde_json::json;

    fn scenario() -> TestCase {
        TestCase::source("basic", "name = John\nage = 30")
            .with_validation(
                "parse",
                ValidationSlot::new(json!([
                    {"key": "name", "value": "John"},
                    {"key": "age", "value": "30"}
                ])),
            )
            .with_validation("get_int", ValidationSlot::new(json!(30)).with_args(["age"]))
    }

    #[test]
    fn expands_one_test_per_slot_in_canonical_order() {
        let out = expand(&scenario());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "basic_parse");
        assert_eq!(out[1].name, "basic_get_int");

        let parse = out[0].flat_validation().unwrap();
        assert_eq!(
            parse.expected,
            ExpectedPayload::Entries(vec![Entry::new("name", "John"), Entry::new("age", "30")])
        );
        assert!(parse.args.is_empty());
        assert_eq!(parse.functions, [FunctionId::from("parse")]);
        assert_eq!(parse.source_test.as_deref(), Some("basic"));

        let get_int = out[1].flat_validation().unwrap();
        assert_eq!(get_int.expected, ExpectedPayload::Scalar(json!(30)));
        assert_eq!(get_int.args, ["age"]);
    }

    #[test]
    fn flat_and_empty_tests_are_returned_unchanged() {
        let flat = expand(&scenario())[0].clone();
        assert_eq!(expand(&flat), vec![flat.clone()]);
        let empty = TestCase::source("nothing", "");
        assert_eq!(expand(&empty), vec![empty.clone()]);
    }

    #[test]
    fn behaviors_are_filtered_per_validation() {
        let t = TestCase::source("b", "flag = true")
            .with_validation("parse", ValidationSlot::new(json!([])))
            .with_validation("get_bool", ValidationSlot::new(json!(true)).with_args(["flag"]))
            .with_behaviors(["boolean_strict"]);
        let out = expand(&t);
        assert!(out[0].behaviors.is_empty());
        assert_eq!(out[1].behaviors, ["boolean_strict"]);
    }

    #[test]
    fn conflicts_collapse_when_filtered_empty() {
        let t = TestCase::source("c", "x = 1")
            .with_validation("parse", ValidationSlot::new(json!([])))
            .with_validation("get_bool", ValidationSlot::new(json!(false)))
            .with_conflicts(ConflictSet::behaviors(["boolean_strict"]));
        let out = expand(&t);
        assert_eq!(out[0].conflicts, None);
        assert_eq!(
            out[1].conflicts,
            Some(ConflictSet::behaviors(["boolean_strict"]))
        );
    }

    #[test]
    fn conflicts_with_other_kinds_survive_behavior_filtering() {
        let mut conflicts = ConflictSet::behaviors(["boolean_strict"]);
        conflicts.variants.push("reference_compliant".into());
        let t = TestCase::source("c", "x = 1")
            .with_validation("parse", ValidationSlot::new(json!([])))
            .with_conflicts(conflicts);
        let derived = &expand(&t)[0];
        let kept = derived.conflicts.as_ref().unwrap();
        assert!(kept.behaviors.is_empty());
        assert_eq!(kept.variants, ["reference_compliant"]);
    }

    #[test]
    fn implied_features_are_added_once() {
        let t = TestCase::source("f", "/= note\na = 1")
            .with_validation("filter", ValidationSlot::new(json!([])))
            .with_validation("expand_dotted", ValidationSlot::new(json!([])))
            .with_features(["comments"]);
        let out = expand(&t);
        assert_eq!(out[0].features, ["comments"]);
        assert_eq!(out[1].features, ["comments", "experimental_dotted_keys"]);
    }

    #[test]
    fn variants_level_and_tags_are_copied() {
        let mut t = scenario().with_variants(["proposed_behavior"]).with_level(2);
        t.tags = vec!["basic".into()];
        for derived in expand(&t) {
            assert_eq!(derived.variants, ["proposed_behavior"]);
            assert_eq!(derived.level, Some(2));
            assert_eq!(derived.tags, ["basic"]);
        }
    }

    #[test]
    fn untyped_validations_encode_without_args() {
        let t = TestCase::source("a", "x = 1")
            .with_validation("parse", ValidationSlot::new(json!([])).with_args(["stray"]));
        let v = serde_json::to_value(&expand(&t)[0]).unwrap();
        assert!(v.get("args").is_none());
        assert_eq!(v["behaviors"], json!([]));
    }

    #[test]
    fn expand_all_concatenates() {
        let tests = vec![scenario(), TestCase::source("empty", "")];
        let names: Vec<String> = expand_all(&tests).into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["basic_parse", "basic_get_int", "empty"]);
    }
}
