// SPDX-License-Identifier: MIT OR Apache-2.0
//! The closed vocabulary of known functions, features, behaviours and
//! variants.
//!
//! [`Function::ALL`] is the canonical validation order: expansion of a
//! source test always emits derived tests in this order, independent of how
//! the validations were written on disk.

use crate::ids::{BehaviorId, FeatureId, FunctionId, VariantId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// A known function / validation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Function {
    /// Parse input into flat key/value entries.
    Parse,
    /// Parse with indentation-aware continuation lines.
    ParseIndented,
    /// Parse after stripping common leading indentation.
    ParseDedented,
    /// Parse a nested value string into entries.
    ParseValue,
    /// Drop comment entries.
    Filter,
    /// Combine two entry lists.
    Combine,
    /// Compose several inputs.
    Compose,
    /// Expand `a.b = c` keys into nested entries.
    ExpandDotted,
    /// Build a nested object from entries.
    BuildHierarchy,
    /// Typed string access.
    GetString,
    /// Typed integer access.
    GetInt,
    /// Typed boolean access.
    GetBool,
    /// Typed float access.
    GetFloat,
    /// Typed list access.
    GetList,
    /// Render entries back to text.
    PrettyPrint,
    /// Parse then print, expecting the original text.
    RoundTrip,
    /// Composition associativity property.
    Associativity,
    /// Canonical text rendering.
    CanonicalFormat,
    /// Load a document end to end.
    Load,
}

/// How the expected result of a validation is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadFamily {
    /// Ordered key/value entries.
    Entries,
    /// A nested key → value object.
    Object,
    /// A single scalar value.
    Scalar,
    /// An ordered list of values.
    List,
}

impl Function {
    /// Every known function, in canonical validation order.
    pub const ALL: [Self; 19] = [
        Self::Parse,
        Self::ParseIndented,
        Self::ParseDedented,
        Self::ParseValue,
        Self::Filter,
        Self::Combine,
        Self::Compose,
        Self::ExpandDotted,
        Self::BuildHierarchy,
        Self::GetString,
        Self::GetInt,
        Self::GetBool,
        Self::GetFloat,
        Self::GetList,
        Self::PrettyPrint,
        Self::RoundTrip,
        Self::Associativity,
        Self::CanonicalFormat,
        Self::Load,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::ParseIndented => "parse_indented",
            Self::ParseDedented => "parse_dedented",
            Self::ParseValue => "parse_value",
            Self::Filter => "filter",
            Self::Combine => "combine",
            Self::Compose => "compose",
            Self::ExpandDotted => "expand_dotted",
            Self::BuildHierarchy => "build_hierarchy",
            Self::GetString => "get_string",
            Self::GetInt => "get_int",
            Self::GetBool => "get_bool",
            Self::GetFloat => "get_float",
            Self::GetList => "get_list",
            Self::PrettyPrint => "pretty_print",
            Self::RoundTrip => "round_trip",
            Self::Associativity => "associativity",
            Self::CanonicalFormat => "canonical_format",
            Self::Load => "load",
        }
    }

    /// Look up a function by wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Position in [`Function::ALL`].
    pub fn canonical_index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|f| f == self)
            .unwrap_or(Self::ALL.len())
    }

    /// Shape of this function's expected result.
    pub fn payload_family(&self) -> PayloadFamily {
        match self {
            Self::Parse
            | Self::ParseIndented
            | Self::ParseDedented
            | Self::ParseValue
            | Self::Filter
            | Self::Combine
            | Self::Compose
            | Self::ExpandDotted
            | Self::Load => PayloadFamily::Entries,
            Self::BuildHierarchy => PayloadFamily::Object,
            Self::GetString
            | Self::GetInt
            | Self::GetBool
            | Self::GetFloat
            | Self::PrettyPrint
            | Self::RoundTrip
            | Self::Associativity
            | Self::CanonicalFormat => PayloadFamily::Scalar,
            Self::GetList => PayloadFamily::List,
        }
    }

    /// Typed accessors are the only validations that take `args`.
    pub fn is_typed_accessor(&self) -> bool {
        matches!(
            self,
            Self::GetString | Self::GetInt | Self::GetBool | Self::GetFloat | Self::GetList
        )
    }

    /// Features a test exercising this function needs regardless of what
    /// the test author declared.
    pub fn implied_features(&self) -> &'static [Feature] {
        match self {
            Self::Filter => &[Feature::Comments],
            Self::ExpandDotted => &[Feature::ExperimentalDottedKeys],
            _ => &[],
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Function> for FunctionId {
    fn from(f: Function) -> Self {
        FunctionId::from(f.as_str())
    }
}

impl FunctionId {
    /// The known [`Function`] this identifier names, if any.
    pub fn known(&self) -> Option<Function> {
        Function::parse(self.as_str())
    }

    /// Sort key for canonical validation ordering: known functions by their
    /// declared position, then unknown names lexicographically.
    pub fn canonical_key(&self) -> (usize, &str) {
        let idx = self
            .known()
            .map_or(Function::ALL.len(), |f| f.canonical_index());
        (idx, self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// A known optional language feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// `/=` comment entries.
    Comments,
    /// Entries with an empty key.
    EmptyKeys,
    /// Dotted keys expanded into nesting.
    ExperimentalDottedKeys,
    /// Values spanning several lines.
    Multiline,
    /// Non-ASCII keys and values.
    Unicode,
    /// Significant whitespace handling.
    Whitespace,
}

impl Feature {
    /// Every known feature.
    pub const ALL: [Self; 6] = [
        Self::Comments,
        Self::EmptyKeys,
        Self::ExperimentalDottedKeys,
        Self::Multiline,
        Self::Unicode,
        Self::Whitespace,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comments => "comments",
            Self::EmptyKeys => "empty_keys",
            Self::ExperimentalDottedKeys => "experimental_dotted_keys",
            Self::Multiline => "multiline",
            Self::Unicode => "unicode",
            Self::Whitespace => "whitespace",
        }
    }

    /// Look up a feature by wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }
}

impl From<Feature> for FeatureId {
    fn from(f: Feature) -> Self {
        FeatureId::from(f.as_str())
    }
}

impl FeatureId {
    /// The known [`Feature`] this identifier names, if any.
    pub fn known(&self) -> Option<Feature> {
        Feature::parse(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Behaviours
// ---------------------------------------------------------------------------

/// A set of mutually-exclusive behaviours; an implementation picks at most
/// one from each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorGroup {
    /// CRLF normalisation vs. literal preservation.
    CrlfHandling,
    /// Tab preservation vs. expansion.
    TabHandling,
    /// Strict vs. loose spacing around `=`.
    Spacing,
    /// Strict vs. lenient boolean coercion.
    Boolean,
    /// Whether a single value coerces to a one-element list.
    ListCoercion,
    /// Insertion vs. lexicographic ordering of list members.
    ArrayOrder,
}

impl BehaviorGroup {
    /// Every group, in a fixed order so validation errors are deterministic.
    pub const ALL: [Self; 6] = [
        Self::CrlfHandling,
        Self::TabHandling,
        Self::Spacing,
        Self::Boolean,
        Self::ListCoercion,
        Self::ArrayOrder,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrlfHandling => "crlf_handling",
            Self::TabHandling => "tab_handling",
            Self::Spacing => "spacing",
            Self::Boolean => "boolean",
            Self::ListCoercion => "list_coercion",
            Self::ArrayOrder => "array_order",
        }
    }

    /// The behaviours in this group.
    pub fn members(&self) -> [Behavior; 2] {
        match self {
            Self::CrlfHandling => [Behavior::CrlfNormalizeToLf, Behavior::CrlfPreserveLiteral],
            Self::TabHandling => [Behavior::TabsPreserve, Behavior::TabsToSpaces],
            Self::Spacing => [Behavior::StrictSpacing, Behavior::LooseSpacing],
            Self::Boolean => [Behavior::BooleanStrict, Behavior::BooleanLenient],
            Self::ListCoercion => [
                Behavior::ListCoercionEnabled,
                Behavior::ListCoercionDisabled,
            ],
            Self::ArrayOrder => [
                Behavior::ArrayOrderInsertion,
                Behavior::ArrayOrderLexicographic,
            ],
        }
    }
}

impl fmt::Display for BehaviorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known behaviour choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    /// Convert `\r\n` to `\n` before parsing.
    CrlfNormalizeToLf,
    /// Keep `\r\n` verbatim in values.
    CrlfPreserveLiteral,
    /// Keep tab characters.
    TabsPreserve,
    /// Expand tabs to spaces.
    TabsToSpaces,
    /// Require exact spacing around `=`.
    StrictSpacing,
    /// Accept arbitrary spacing around `=`.
    LooseSpacing,
    /// Only `true`/`false` are booleans.
    BooleanStrict,
    /// Accept `yes`/`no`/`1`/`0` and friends.
    BooleanLenient,
    /// A scalar coerces to a one-element list.
    ListCoercionEnabled,
    /// A scalar is not a list.
    ListCoercionDisabled,
    /// Lists keep insertion order.
    ArrayOrderInsertion,
    /// Lists are sorted lexicographically.
    ArrayOrderLexicographic,
}

impl Behavior {
    /// Every known behaviour.
    pub const ALL: [Self; 12] = [
        Self::CrlfNormalizeToLf,
        Self::CrlfPreserveLiteral,
        Self::TabsPreserve,
        Self::TabsToSpaces,
        Self::StrictSpacing,
        Self::LooseSpacing,
        Self::BooleanStrict,
        Self::BooleanLenient,
        Self::ListCoercionEnabled,
        Self::ListCoercionDisabled,
        Self::ArrayOrderInsertion,
        Self::ArrayOrderLexicographic,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrlfNormalizeToLf => "crlf_normalize_to_lf",
            Self::CrlfPreserveLiteral => "crlf_preserve_literal",
            Self::TabsPreserve => "tabs_preserve",
            Self::TabsToSpaces => "tabs_to_spaces",
            Self::StrictSpacing => "strict_spacing",
            Self::LooseSpacing => "loose_spacing",
            Self::BooleanStrict => "boolean_strict",
            Self::BooleanLenient => "boolean_lenient",
            Self::ListCoercionEnabled => "list_coercion_enabled",
            Self::ListCoercionDisabled => "list_coercion_disabled",
            Self::ArrayOrderInsertion => "array_order_insertion",
            Self::ArrayOrderLexicographic => "array_order_lexicographic",
        }
    }

    /// Look up a behaviour by wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.as_str() == name)
    }

    /// The exclusive group this behaviour belongs to.
    pub fn group(&self) -> BehaviorGroup {
        match self {
            Self::CrlfNormalizeToLf | Self::CrlfPreserveLiteral => BehaviorGroup::CrlfHandling,
            Self::TabsPreserve | Self::TabsToSpaces => BehaviorGroup::TabHandling,
            Self::StrictSpacing | Self::LooseSpacing => BehaviorGroup::Spacing,
            Self::BooleanStrict | Self::BooleanLenient => BehaviorGroup::Boolean,
            Self::ListCoercionEnabled | Self::ListCoercionDisabled => BehaviorGroup::ListCoercion,
            Self::ArrayOrderInsertion | Self::ArrayOrderLexicographic => BehaviorGroup::ArrayOrder,
        }
    }
}

impl From<Behavior> for BehaviorId {
    fn from(b: Behavior) -> Self {
        BehaviorId::from(b.as_str())
    }
}

impl BehaviorId {
    /// The known [`Behavior`] this identifier names, if any.
    pub fn known(&self) -> Option<Behavior> {
        Behavior::parse(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// A known specification variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Follows the proposed (next-revision) behaviour.
    ProposedBehavior,
    /// Matches the reference implementation exactly.
    ReferenceCompliant,
}

impl Variant {
    /// Every known variant.
    pub const ALL: [Self; 2] = [Self::ProposedBehavior, Self::ReferenceCompliant];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProposedBehavior => "proposed_behavior",
            Self::ReferenceCompliant => "reference_compliant",
        }
    }

    /// Look up a variant by wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == name)
    }
}

impl From<Variant> for VariantId {
    fn from(v: Variant) -> Self {
        VariantId::from(v.as_str())
    }
}

impl VariantId {
    /// The known [`Variant`] this identifier names, if any.
    pub fn known(&self) -> Option<Variant> {
        Variant::parse(self.as_str())
    }
}
