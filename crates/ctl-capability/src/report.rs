// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compatibility summaries over a test collection.

use crate::CapabilityDeclaration;
use crate::compat::{CompatibilityAxis, Incompatibility, check};
use ctl_core::TestCase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a collection of tests fares against one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    /// Declaration label.
    pub implementation: String,
    /// Tests evaluated.
    pub total: usize,
    /// Tests that pass every check.
    pub compatible: usize,
    /// Tests that fail at least one check.
    pub incompatible: usize,
    /// Incompatible tests per first failing axis.
    pub by_axis: BTreeMap<CompatibilityAxis, usize>,
    /// Each rejected test with its reason, in input order.
    pub rejected: Vec<(String, Incompatibility)>,
    /// One-line human-readable summary.
    pub summary: String,
}

impl CompatibilityReport {
    /// `true` when every test is compatible.
    #[must_use]
    pub fn all_compatible(&self) -> bool {
        self.incompatible == 0
    }
}

/// Evaluate every test and summarise.
#[must_use]
pub fn generate_report(decl: &CapabilityDeclaration, tests: &[TestCase]) -> CompatibilityReport {
    let mut by_axis: BTreeMap<CompatibilityAxis, usize> = BTreeMap::new();
    let mut rejected = Vec::new();
    for test in tests {
        if let Err(reason) = check(decl, test) {
            *by_axis.entry(reason.axis()).or_default() += 1;
            rejected.push((test.name.clone(), reason));
        }
    }

    let total = tests.len();
    let incompatible = rejected.len();
    let compatible = total - incompatible;
    let breakdown = by_axis
        .iter()
        .map(|(axis, n)| format!("{axis}: {n}"))
        .collect::<Vec<_>>()
        .join(", ");
    let summary = if breakdown.is_empty() {
        format!("{compatible}/{total} tests compatible")
    } else {
        format!("{compatible}/{total} tests compatible ({breakdown})")
    };

    CompatibilityReport {
        implementation: decl.label(),
        total,
        compatible,
        incompatible,
        by_axis,
        rejected,
        summary,
    }
}
