// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cross-crate properties: expansion, compatibility and statistics agree
//! with each other over arbitrary collections.

use ctl_capability::{CapabilityDeclaration, filter_compatible, generate_report, is_compatible};
use ctl_core::{
    Behavior, BehaviorGroup, ConflictSet, Feature, Function, TestCase, ValidationSlot, Variant,
};
use ctl_loader::statistics;
use ctl_transform::expand_all;
use proptest::prelude::*;
use serde_json::{Value, json};

fn fast_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    }
}

// ── Strategies ──────────────────────────────────────────────────────────

fn arb_functions() -> BoxedStrategy<Vec<Function>> {
    proptest::sample::subsequence(Function::ALL.to_vec(), 0..=Function::ALL.len()).boxed()
}

fn arb_features() -> BoxedStrategy<Vec<Feature>> {
    proptest::sample::subsequence(Feature::ALL.to_vec(), 0..=Feature::ALL.len()).boxed()
}

/// At most one behaviour per group, so the declaration always validates.
fn arb_behavior_choices() -> BoxedStrategy<Vec<Behavior>> {
    proptest::collection::vec(proptest::option::of(0usize..2), BehaviorGroup::ALL.len())
        .prop_map(|picks| {
            BehaviorGroup::ALL
                .iter()
                .zip(picks)
                .filter_map(|(group, pick)| pick.map(|i| group.members()[i]))
                .collect()
        })
        .boxed()
}

fn arb_declaration() -> BoxedStrategy<CapabilityDeclaration> {
    (
        arb_functions(),
        arb_features(),
        arb_behavior_choices(),
        proptest::sample::select(Variant::ALL.to_vec()),
    )
        .prop_map(|(functions, features, behaviors, variant)| {
            CapabilityDeclaration::new("prop", "0")
                .with_functions(functions)
                .with_features(features)
                .with_behaviors(behaviors)
                .with_variant(variant)
        })
        .boxed()
}

fn arb_source_test() -> BoxedStrategy<TestCase> {
    (
        "[a-z]{1,8}",
        proptest::collection::vec(
            (proptest::sample::select(Function::ALL.to_vec()), any::<u8>()),
            1..5,
        ),
        proptest::collection::vec(proptest::sample::select(Feature::ALL.to_vec()), 0..2),
        proptest::collection::vec(proptest::sample::select(Behavior::ALL.to_vec()), 0..3),
        proptest::collection::vec(proptest::sample::select(Variant::ALL.to_vec()), 0..2),
        proptest::collection::vec(proptest::sample::select(Behavior::ALL.to_vec()), 0..2),
        proptest::option::of(1u32..5),
    )
        .prop_map(
            |(name, slots, features, behaviors, variants, conflicts, level)| {
                let mut t = TestCase::source(name, "a = 1")
                    .with_features(features)
                    .with_behaviors(behaviors)
                    .with_variants(variants)
                    .with_conflicts(ConflictSet::behaviors(conflicts));
                for (f, n) in slots {
                    t = t.with_validation(f, ValidationSlot::new(json!(n)));
                }
                if let Some(level) = level {
                    t = t.with_level(level);
                }
                t
            },
        )
        .boxed()
}

fn arb_flat_collection() -> BoxedStrategy<Vec<TestCase>> {
    proptest::collection::vec(arb_source_test(), 0..6)
        .prop_map(|tests| expand_all(&tests))
        .boxed()
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(fast_config())]

    /// Adding functions or features never makes a compatible test
    /// incompatible.
    #[test]
    fn compatibility_is_monotone_in_supported_sets(
        decl in arb_declaration(),
        more_functions in arb_functions(),
        more_features in arb_features(),
        tests in arb_flat_collection(),
    ) {
        let wider = decl
            .clone()
            .with_functions(more_functions)
            .with_features(more_features);
        for t in &tests {
            if is_compatible(&decl, t) {
                prop_assert!(is_compatible(&wider, t), "{} lost compatibility", t.name);
            }
        }
    }

    /// Statistics and the report count exactly what filtering keeps.
    #[test]
    fn statistics_match_filtering(decl in arb_declaration(), tests in arb_flat_collection()) {
        let kept = filter_compatible(&decl, &tests);
        let stats = statistics(&decl, &tests);
        prop_assert_eq!(stats.total_tests, tests.len());
        prop_assert_eq!(stats.total_assertions, tests.len());
        prop_assert_eq!(stats.compatible_tests, kept.len());
        prop_assert_eq!(stats.compatible_assertions, kept.len());

        let report = generate_report(&decl, &tests);
        prop_assert_eq!(report.compatible, kept.len());
        prop_assert_eq!(report.compatible + report.incompatible, report.total);
    }

    /// Boolean behaviours survive expansion on `get_bool` tests only.
    #[test]
    fn boolean_choices_only_gate_get_bool(t in arb_source_test()) {
        let t = t.with_behaviors([Behavior::BooleanLenient]);
        for derived in expand_all(std::slice::from_ref(&t)) {
            let touches_bool = derived.validation().and_then(|v| v.known()) == Some(Function::GetBool);
            let has_bool = derived.behaviors.iter().any(|b| b == "boolean_lenient");
            prop_assert_eq!(has_bool, touches_bool);
        }
    }

    /// Empty capability lists survive encoding as `[]` and decode to the
    /// same value as absent lists.
    #[test]
    fn empty_lists_round_trip_like_absent_ones(tests in arb_flat_collection()) {
        for t in tests {
            let mut encoded: Value = serde_json::to_value(&t).unwrap();
            let back: TestCase = serde_json::from_value(encoded.clone()).unwrap();
            prop_assert_eq!(&back, &t);

            let obj = encoded.as_object_mut().unwrap();
            for field in ["features", "behaviors", "variants"] {
                let empty = obj[field].as_array().is_some_and(Vec::is_empty);
                if empty {
                    obj.remove(field);
                }
            }
            let stripped: TestCase = serde_json::from_value(encoded).unwrap();
            prop_assert_eq!(stripped, t);
        }
    }
}
