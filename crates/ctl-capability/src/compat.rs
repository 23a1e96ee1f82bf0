// SPDX-License-Identifier: MIT OR Apache-2.0
//! The five-axis compatibility predicate.
//!
//! Requirement axes affirm (a missing capability fails the test); conflict
//! axes disqualify (a present capability fails the test). The two kinds are
//! checked separately and never folded into one set intersection.

use crate::CapabilityDeclaration;
use ctl_core::{BehaviorId, FeatureId, FunctionId, TestCase, VariantId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// One of the five independent compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityAxis {
    /// Required functions are supported.
    Functions,
    /// Required features are supported.
    Features,
    /// No conflicting behaviour is chosen.
    BehaviorConflicts,
    /// The chosen variant is not a conflicting one.
    VariantConflicts,
    /// Required behaviours are chosen and required variants match.
    Requirements,
}

impl CompatibilityAxis {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Functions => "functions",
            Self::Features => "features",
            Self::BehaviorConflicts => "behavior_conflicts",
            Self::VariantConflicts => "variant_conflicts",
            Self::Requirements => "requirements",
        }
    }
}

impl fmt::Display for CompatibilityAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a test is not compatible with a declaration: the first failing check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "name", rename_all = "snake_case")]
pub enum Incompatibility {
    /// A required function is not supported.
    UnsupportedFunction(FunctionId),
    /// A required feature is not supported.
    UnsupportedFeature(FeatureId),
    /// The declaration chose a behaviour the test conflicts with.
    ConflictingBehavior(BehaviorId),
    /// The declaration's variant is one the test conflicts with.
    ConflictingVariant(VariantId),
    /// A required behaviour was not chosen.
    MissingBehavior(BehaviorId),
    /// A required variant differs from the declaration's.
    VariantMismatch(VariantId),
}

impl Incompatibility {
    /// The axis this reason belongs to.
    pub fn axis(&self) -> CompatibilityAxis {
        match self {
            Self::UnsupportedFunction(_) => CompatibilityAxis::Functions,
            Self::UnsupportedFeature(_) => CompatibilityAxis::Features,
            Self::ConflictingBehavior(_) => CompatibilityAxis::BehaviorConflicts,
            Self::ConflictingVariant(_) => CompatibilityAxis::VariantConflicts,
            Self::MissingBehavior(_) | Self::VariantMismatch(_) => CompatibilityAxis::Requirements,
        }
    }
}

impl fmt::Display for Incompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFunction(x) => write!(f, "function '{x}' is not supported"),
            Self::UnsupportedFeature(x) => write!(f, "feature '{x}' is not supported"),
            Self::ConflictingBehavior(x) => write!(f, "behavior '{x}' conflicts with the test"),
            Self::ConflictingVariant(x) => write!(f, "variant '{x}' conflicts with the test"),
            Self::MissingBehavior(x) => write!(f, "behavior '{x}' is required"),
            Self::VariantMismatch(x) => write!(f, "variant '{x}' is required"),
        }
    }
}

/// Check `test` against `decl`, returning the first failing reason.
///
/// The function axis covers the flat validation and the derived
/// `functions`; source tests carry neither and pass it trivially.
pub fn check(decl: &CapabilityDeclaration, test: &TestCase) -> Result<(), Incompatibility> {
    let result = check_axes(decl, test);
    if let Err(reason) = &result {
        trace!(
            target: "ctl.compat",
            test = %test.name,
            axis = %reason.axis(),
            %reason,
            "test incompatible"
        );
    }
    result
}

fn check_axes(decl: &CapabilityDeclaration, test: &TestCase) -> Result<(), Incompatibility> {
    if let Some(flat) = test.flat_validation() {
        for f in std::iter::once(&flat.validation).chain(&flat.functions) {
            if !decl.has_function(f.as_str()) {
                return Err(Incompatibility::UnsupportedFunction(f.clone()));
            }
        }
    }

    if let Some(f) = test.features.iter().find(|f| !decl.has_feature(f.as_str())) {
        return Err(Incompatibility::UnsupportedFeature(f.clone()));
    }

    if let Some(conflicts) = &test.conflicts {
        if let Some(b) = conflicts
            .behaviors
            .iter()
            .find(|b| decl.has_behavior(b.as_str()))
        {
            return Err(Incompatibility::ConflictingBehavior(b.clone()));
        }
        if let Some(v) = conflicts
            .variants
            .iter()
            .find(|v| decl.has_variant(v.as_str()))
        {
            return Err(Incompatibility::ConflictingVariant(v.clone()));
        }
    }

    if let Some(b) = test.behaviors.iter().find(|b| !decl.has_behavior(b.as_str())) {
        return Err(Incompatibility::MissingBehavior(b.clone()));
    }
    if let Some(v) = test.variants.iter().find(|v| !decl.has_variant(v.as_str())) {
        return Err(Incompatibility::VariantMismatch(v.clone()));
    }
    Ok(())
}

/// `true` when every check passes.
#[must_use]
pub fn is_compatible(decl: &CapabilityDeclaration, test: &TestCase) -> bool {
    check(decl, test).is_ok()
}

/// The compatible tests, in input order.
#[must_use]
pub fn filter_compatible<'a>(
    decl: &CapabilityDeclaration,
    tests: &'a [TestCase],
) -> Vec<&'a TestCase> {
    tests.iter().filter(|t| is_compatible(decl, t)).collect()
}

/// Owned variant of [`filter_compatible`].
#[must_use]
pub fn retain_compatible(decl: &CapabilityDeclaration, mut tests: Vec<TestCase>) -> Vec<TestCase> {
    tests.retain(|t| is_compatible(decl, t));
    tests
}
