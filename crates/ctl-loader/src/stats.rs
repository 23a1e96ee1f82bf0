// SPDX-License-Identifier: MIT OR Apache-2.0
//! Statistics and capability coverage over a loaded collection.

use ctl_capability::{CapabilityDeclaration, filter_compatible, is_compatible};
use ctl_core::TestCase;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Counts over a test collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStatistics {
    /// Tests in the collection.
    pub total_tests: usize,
    /// Assertions: one per flat test, one per slot per source test.
    pub total_assertions: usize,
    /// Tests compatible with the declaration.
    pub compatible_tests: usize,
    /// Assertions in compatible tests.
    pub compatible_assertions: usize,
    /// Tests per legacy level; unlevelled tests are not counted.
    pub by_level: BTreeMap<u32, usize>,
    /// Tests touching each function.
    pub by_function: BTreeMap<String, usize>,
    /// Tests requiring each feature.
    pub by_feature: BTreeMap<String, usize>,
    /// Tests carrying a conflict set.
    pub tests_with_conflicts: usize,
    /// Conflict kind (`functions`, `behaviors`, `variants`, `features`) →
    /// every name some test conflicts with.
    pub conflicting: BTreeMap<String, BTreeSet<String>>,
}

/// Build [`TestStatistics`] in one pass. The compatible count is the length
/// of [`filter_compatible`]'s output.
#[must_use]
pub fn statistics(decl: &CapabilityDeclaration, tests: &[TestCase]) -> TestStatistics {
    let mut stats = TestStatistics {
        total_tests: tests.len(),
        ..TestStatistics::default()
    };

    for test in tests {
        stats.total_assertions += test.assertion_count();
        if let Some(level) = test.level {
            *stats.by_level.entry(level).or_default() += 1;
        }
        for f in test.touched_functions() {
            *stats.by_function.entry(f.to_string()).or_default() += 1;
        }
        let features: BTreeSet<&str> = test.features.iter().map(|f| f.as_str()).collect();
        for f in features {
            *stats.by_feature.entry(f.to_string()).or_default() += 1;
        }
        if let Some(conflicts) = &test.conflicts {
            stats.tests_with_conflicts += 1;
            let kinds: [(&str, Vec<&str>); 4] = [
                ("functions", conflicts.functions.iter().map(|x| x.as_str()).collect()),
                ("behaviors", conflicts.behaviors.iter().map(|x| x.as_str()).collect()),
                ("variants", conflicts.variants.iter().map(|x| x.as_str()).collect()),
                ("features", conflicts.features.iter().map(|x| x.as_str()).collect()),
            ];
            for (kind, names) in kinds {
                if names.is_empty() {
                    continue;
                }
                stats
                    .conflicting
                    .entry(kind.to_string())
                    .or_default()
                    .extend(names.into_iter().map(str::to_string));
            }
        }
    }

    let compatible = filter_compatible(decl, tests);
    stats.compatible_tests = compatible.len();
    stats.compatible_assertions = compatible.iter().map(|t| t.assertion_count()).sum();
    stats
}

/// Tests available for, and compatible among, one capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEntry {
    /// Tests exercising the capability.
    pub available: usize,
    /// Of those, tests compatible with the declaration.
    pub compatible: usize,
}

/// Per-capability coverage for a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityCoverage {
    /// Each supported function.
    pub functions: BTreeMap<String, CoverageEntry>,
    /// Each supported feature.
    pub features: BTreeMap<String, CoverageEntry>,
}

/// Coverage of each supported function and feature by `tests`.
#[must_use]
pub fn capability_coverage(decl: &CapabilityDeclaration, tests: &[TestCase]) -> CapabilityCoverage {
    let verdicts: Vec<bool> = tests.iter().map(|t| is_compatible(decl, t)).collect();
    let mut coverage = CapabilityCoverage::default();

    for function in decl
        .supported_functions
        .iter()
        .filter(|f| decl.has_function(f.as_str()))
    {
        let entry = coverage.functions.entry(function.to_string()).or_default();
        for (test, &ok) in tests.iter().zip(&verdicts) {
            if test.touched_functions().contains(&function) {
                entry.available += 1;
                entry.compatible += usize::from(ok);
            }
        }
    }

    for feature in decl
        .supported_features
        .iter()
        .filter(|f| decl.has_feature(f.as_str()))
    {
        let entry = coverage.features.entry(feature.to_string()).or_default();
        for (test, &ok) in tests.iter().zip(&verdicts) {
            if test.features.contains(feature) {
                entry.available += 1;
                entry.compatible += usize::from(ok);
            }
        }
    }
    coverage
}
