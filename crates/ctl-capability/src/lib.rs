// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Capability declarations and test compatibility.
//!
//! A [`CapabilityDeclaration`] records what one implementation supports.
//! [`CapabilityDeclaration::validate`] rejects declarations that pick more
//! than one behaviour from a mutually-exclusive group; the compatibility
//! engine in [`compat`] then decides, test by test, whether the
//! implementation should run it. [`report`] summarises a whole collection.

pub mod compat;
pub mod report;

pub use compat::{
    CompatibilityAxis, Incompatibility, check, filter_compatible, is_compatible,
    retain_compatible,
};
pub use report::{CompatibilityReport, generate_report};

use ctl_core::{BehaviorGroup, BehaviorId, FeatureId, FunctionId, Variant, VariantId};
use ctl_error::{CodedError, ErrorCode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A declaration that must not be used for filtering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    /// More than one behaviour chosen from one group.
    #[error("conflicting_behaviors: multiple conflicting behaviors in group: {group}")]
    ConflictingBehaviors {
        /// The offending group.
        group: BehaviorGroup,
        /// The behaviours chosen from it.
        behaviors: Vec<BehaviorId>,
    },

    /// No variant chosen.
    #[error("missing_variant: a declaration must choose exactly one variant")]
    MissingVariant,
}

impl CodedError for CapabilityError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::ConflictingBehaviors { .. } => ErrorCode::ConfigConflictingBehaviors,
            Self::MissingVariant => ErrorCode::ConfigInvalid,
        }
    }
}

// ---------------------------------------------------------------------------
// CapabilityDeclaration
// ---------------------------------------------------------------------------

/// What one implementation supports.
///
/// Immutable for the duration of an evaluation. Features are closed-world:
/// a feature in neither `supported_features` nor `unsupported_features` is
/// unsupported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CapabilityDeclaration {
    /// Implementation name.
    #[serde(default)]
    pub name: String,
    /// Implementation version.
    #[serde(default)]
    pub version: String,
    /// Functions the implementation can execute.
    #[serde(default)]
    pub supported_functions: BTreeSet<FunctionId>,
    /// Functions explicitly disabled; overrides `supported_functions`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unsupported_functions: BTreeSet<FunctionId>,
    /// Features explicitly enabled.
    #[serde(default)]
    pub supported_features: BTreeSet<FeatureId>,
    /// Features explicitly disabled; overrides `supported_features`.
    #[serde(default)]
    pub unsupported_features: BTreeSet<FeatureId>,
    /// At most one behaviour per group.
    #[serde(default)]
    pub behavior_choices: BTreeSet<BehaviorId>,
    /// The specification variant.
    #[serde(default = "default_variant")]
    pub variant_choice: VariantId,
}

fn default_variant() -> VariantId {
    Variant::ProposedBehavior.into()
}

impl Default for CapabilityDeclaration {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            supported_functions: BTreeSet::new(),
            unsupported_functions: BTreeSet::new(),
            supported_features: BTreeSet::new(),
            unsupported_features: BTreeSet::new(),
            behavior_choices: BTreeSet::new(),
            variant_choice: default_variant(),
        }
    }
}

impl CapabilityDeclaration {
    /// A declaration supporting nothing, on the default variant.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Add supported functions.
    #[must_use]
    pub fn with_functions<I, F>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FunctionId>,
    {
        self.supported_functions
            .extend(functions.into_iter().map(Into::into));
        self
    }

    /// Add supported features.
    #[must_use]
    pub fn with_features<I, F>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FeatureId>,
    {
        self.supported_features
            .extend(features.into_iter().map(Into::into));
        self
    }

    /// Add explicitly unsupported features.
    #[must_use]
    pub fn without_features<I, F>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FeatureId>,
    {
        self.unsupported_features
            .extend(features.into_iter().map(Into::into));
        self
    }

    /// Add explicitly unsupported functions.
    #[must_use]
    pub fn without_functions<I, F>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FunctionId>,
    {
        self.unsupported_functions
            .extend(functions.into_iter().map(Into::into));
        self
    }

    /// Add behaviour choices.
    #[must_use]
    pub fn with_behaviors<I, B>(mut self, behaviors: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<BehaviorId>,
    {
        self.behavior_choices
            .extend(behaviors.into_iter().map(Into::into));
        self
    }

    /// Set the variant.
    #[must_use]
    pub fn with_variant(mut self, variant: impl Into<VariantId>) -> Self {
        self.variant_choice = variant.into();
        self
    }

    /// Reject declarations with more than one behaviour from a group, or no
    /// variant. Call once before the declaration is used for filtering.
    pub fn validate(&self) -> Result<(), CapabilityError> {
        for group in BehaviorGroup::ALL {
            let chosen: Vec<BehaviorId> = group
                .members()
                .into_iter()
                .map(BehaviorId::from)
                .filter(|b| self.behavior_choices.contains(b))
                .collect();
            if chosen.len() > 1 {
                return Err(CapabilityError::ConflictingBehaviors {
                    group,
                    behaviors: chosen,
                });
            }
        }
        if self.variant_choice.as_str().is_empty() {
            return Err(CapabilityError::MissingVariant);
        }
        Ok(())
    }

    /// Supported and not explicitly disabled.
    #[must_use]
    pub fn has_function(&self, function: &str) -> bool {
        self.supported_functions.contains(function)
            && !self.unsupported_functions.contains(function)
    }

    /// Supported and not explicitly disabled; absent from both sets is
    /// unsupported.
    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        if self.unsupported_features.contains(feature) {
            return false;
        }
        self.supported_features.contains(feature)
    }

    /// The behaviour is among the declared choices.
    #[must_use]
    pub fn has_behavior(&self, behavior: &str) -> bool {
        self.behavior_choices.contains(behavior)
    }

    /// The variant is the declared choice.
    #[must_use]
    pub fn has_variant(&self, variant: &str) -> bool {
        self.variant_choice == variant
    }

    /// `"{name} {version}"`, or just the name when unversioned.
    pub fn label(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.version)
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use ctl_core::{Behavior, Feature, Function};

    fn sample() -> CapabilityDeclaration {
        CapabilityDeclaration::new("ccl-rs", "0.3.0")
            .with_functions([Function::Parse, Function::BuildHierarchy, Function::GetInt])
            .with_features([Feature::Comments])
            .with_behaviors([Behavior::CrlfNormalizeToLf, Behavior::BooleanLenient])
            .with_variant(Variant::ReferenceCompliant)
    }

    #[test]
    fn valid_declaration_passes() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn conflicting_choices_in_one_group_are_rejected() {
        let decl = sample().with_behaviors([Behavior::CrlfPreserveLiteral]);
        let err = decl.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "conflicting_behaviors: multiple conflicting behaviors in group: crlf_handling"
        );
        assert_eq!(err.code(), ErrorCode::ConfigConflictingBehaviors);
        assert!(err.code().is_fatal());
    }

    #[test]
    fn choices_from_different_groups_are_fine() {
        let decl = CapabilityDeclaration::default().with_behaviors([
            Behavior::TabsPreserve,
            Behavior::StrictSpacing,
            Behavior::ListCoercionDisabled,
            Behavior::ArrayOrderInsertion,
        ]);
        assert!(decl.validate().is_ok());
    }

    #[test]
    fn unknown_behaviors_do_not_conflict() {
        let decl = CapabilityDeclaration::default().with_behaviors(["x_one", "x_two"]);
        assert!(decl.validate().is_ok());
    }

    #[test]
    fn empty_variant_is_rejected() {
        let decl = CapabilityDeclaration::default().with_variant("");
        assert_eq!(decl.validate(), Err(CapabilityError::MissingVariant));
    }

    #[test]
    fn feature_membership_is_closed_world() {
        let decl = sample();
        assert!(decl.has_feature("comments"));
        assert!(!decl.has_feature("unicode"));
    }

    #[test]
    fn unsupported_lists_override_supported() {
        let decl = sample()
            .without_features([Feature::Comments])
            .without_functions([Function::GetInt]);
        assert!(!decl.has_feature("comments"));
        assert!(!decl.has_function("get_int"));
        assert!(decl.has_function("parse"));
    }

    #[test]
    fn behavior_and_variant_predicates() {
        let decl = sample();
        assert!(decl.has_behavior("boolean_lenient"));
        assert!(!decl.has_behavior("boolean_strict"));
        assert!(decl.has_variant("reference_compliant"));
        assert!(!decl.has_variant("proposed_behavior"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let decl: CapabilityDeclaration = serde_json::from_str(
            r#"{"name": "x", "supported_functions": ["parse"]}"#,
        )
        .unwrap();
        assert!(decl.has_function("parse"));
        assert_eq!(decl.variant_choice, "proposed_behavior");
        assert!(decl.behavior_choices.is_empty());
    }

    #[test]
    fn label_includes_version_when_present() {
        assert_eq!(sample().label(), "ccl-rs 0.3.0");
        assert_eq!(CapabilityDeclaration::new("bare", "").label(), "bare");
    }
}
