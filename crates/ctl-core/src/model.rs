// SPDX-License-Identifier: MIT OR Apache-2.0
//! The canonical test model.
//!
//! A [`TestCase`] is either source-shaped (many validations over one input)
//! or flat-shaped (exactly one validation). List-valued metadata is always a
//! `Vec`, never an `Option`: an empty list is the only way to say "no
//! requirement". The one normalisation boundary between on-disk records and
//! this model is [`crate::wire`].

use crate::expected::ExpectedPayload;
use crate::ids::{BehaviorId, FeatureId, FunctionId, VariantId};
use crate::wire::{RecordError, TestRecord};
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// `$schema` reference written at the top of generated flat files.
pub const FLAT_FORMAT_SCHEMA: &str = "http://json-schema.org/draft-07/schema#";

// ---------------------------------------------------------------------------
// ConflictSet
// ---------------------------------------------------------------------------

/// Capability choices a test is incompatible with.
///
/// Held as `Option<ConflictSet>` on a test; an all-empty set is never stored
/// (see [`ConflictSet::normalize`]).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ConflictSet {
    /// Conflicting functions.
    #[serde(default)]
    pub functions: Vec<FunctionId>,
    /// Conflicting behaviour choices.
    #[serde(default)]
    pub behaviors: Vec<BehaviorId>,
    /// Conflicting variants.
    #[serde(default)]
    pub variants: Vec<VariantId>,
    /// Conflicting features.
    #[serde(default)]
    pub features: Vec<FeatureId>,
}

impl ConflictSet {
    /// `true` when all four sub-lists are empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.behaviors.is_empty()
            && self.variants.is_empty()
            && self.features.is_empty()
    }

    /// Collapse an empty set to `None`.
    pub fn normalize(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }

    /// A set naming only conflicting behaviours.
    pub fn behaviors<I, B>(behaviors: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<BehaviorId>,
    {
        Self {
            behaviors: behaviors.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A set naming only conflicting variants.
    pub fn variants<I, V>(variants: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<VariantId>,
    {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Validation slots
// ---------------------------------------------------------------------------

/// One named assertion in a source test.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationSlot {
    /// Raw expected value; shaped per validation kind at expansion time.
    pub expected: Value,
    /// Accessor arguments (typed accessors only).
    pub args: Vec<String>,
    /// The implementation is expected to fail.
    pub expect_error: bool,
}

impl ValidationSlot {
    /// A slot expecting `expected`, with no args.
    pub fn new(expected: Value) -> Self {
        Self {
            expected,
            args: Vec::new(),
            expect_error: false,
        }
    }

    /// Set accessor arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the slot as expecting an error.
    #[must_use]
    pub fn expecting_error(mut self) -> Self {
        self.expect_error = true;
        self
    }

    /// Interpret a value from a `validations` map.
    ///
    /// An object carrying an `expect` key is structured (`expect`, `args`,
    /// `error`); anything else is the expected result itself. A bare string
    /// that mentions "error" or "invalid" marks an expected error.
    pub fn from_value(name: &FunctionId, value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(mut map) if map.contains_key("expect") => {
                let expected = map.remove("expect").unwrap_or(Value::Null);
                let args = match map.remove("args") {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items
                        .into_iter()
                        .map(|item| match item {
                            Value::String(s) => Ok(s),
                            other => Err(RecordError::InvalidSlot {
                                validation: name.to_string(),
                                reason: format!("args must be strings, got {other}"),
                            }),
                        })
                        .collect::<Result<_, _>>()?,
                    Some(other) => {
                        return Err(RecordError::InvalidSlot {
                            validation: name.to_string(),
                            reason: format!("args must be an array, got {other}"),
                        });
                    }
                };
                let expect_error = map
                    .remove("error")
                    .or_else(|| map.remove("expect_error"))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                Ok(Self {
                    expected,
                    args,
                    expect_error,
                })
            }
            Value::String(s) => {
                let lower = s.to_lowercase();
                let expect_error = lower.contains("error") || lower.contains("invalid");
                Ok(Self {
                    expected: Value::String(s),
                    args: Vec::new(),
                    expect_error,
                })
            }
            other => Ok(Self::new(other)),
        }
    }

    /// Structured form, always readable by [`ValidationSlot::from_value`].
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("expect".into(), self.expected.clone());
        if !self.args.is_empty() {
            map.insert(
                "args".into(),
                Value::Array(self.args.iter().cloned().map(Value::String).collect()),
            );
        }
        if self.expect_error {
            map.insert("error".into(), Value::Bool(true));
        }
        Value::Object(map)
    }
}

/// Validation name → slot, iterated in canonical validation order.
///
/// Absent slots are simply not present. Ordering is by
/// [`FunctionId::canonical_key`], never by insertion or map order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationMap {
    slots: Vec<(FunctionId, ValidationSlot)>,
}

impl ValidationMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a slot, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<FunctionId>,
        slot: ValidationSlot,
    ) -> Option<ValidationSlot> {
        let name = name.into();
        match self
            .slots
            .binary_search_by(|(k, _)| k.canonical_key().cmp(&name.canonical_key()))
        {
            Ok(idx) => Some(std::mem::replace(&mut self.slots[idx].1, slot)),
            Err(idx) => {
                self.slots.insert(idx, (name, slot));
                None
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<FunctionId>, slot: ValidationSlot) -> Self {
        self.insert(name, slot);
        self
    }

    /// Look up a slot by validation name.
    pub fn get(&self, name: &str) -> Option<&ValidationSlot> {
        self.slots
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, slot)| slot)
    }

    /// Number of present slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` when no slot is present.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Present slots in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&FunctionId, &ValidationSlot)> {
        self.slots.iter().map(|(k, v)| (k, v))
    }

    /// Validation names in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &FunctionId> {
        self.slots.iter().map(|(k, _)| k)
    }
}

impl<N: Into<FunctionId>> FromIterator<(N, ValidationSlot)> for ValidationMap {
    fn from_iter<T: IntoIterator<Item = (N, ValidationSlot)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (name, slot) in iter {
            map.insert(name, slot);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// TestCase
// ---------------------------------------------------------------------------

/// The single validation carried by a flat test.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatValidation {
    /// Validation name.
    pub validation: FunctionId,
    /// Shaped expected result.
    pub expected: ExpectedPayload,
    /// Accessor arguments. Only encoded for typed accessors.
    pub args: Vec<String>,
    /// The implementation is expected to fail.
    pub expect_error: bool,
    /// Functions the test exercises, derived from the validation name.
    pub functions: Vec<FunctionId>,
    /// Name of the source test this one was derived from.
    pub source_test: Option<String>,
}

/// Source (multi-validation) or flat (single-validation) shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TestShape {
    /// Human-maintained: many validations over one input.
    Source(ValidationMap),
    /// Implementation-facing: exactly one validation.
    Flat(FlatValidation),
}

/// A conformance test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TestRecord", into = "TestRecord")]
pub struct TestCase {
    /// Test name, unique within a suite.
    pub name: String,
    /// Input documents; composition tests carry several.
    pub inputs: Vec<String>,
    /// Validation shape.
    pub shape: TestShape,
    /// Required features.
    pub features: Vec<FeatureId>,
    /// Required behaviour choices.
    pub behaviors: Vec<BehaviorId>,
    /// Acceptable variants.
    pub variants: Vec<VariantId>,
    /// Incompatible capability choices.
    pub conflicts: Option<ConflictSet>,
    /// Legacy difficulty level.
    pub level: Option<u32>,
    /// Legacy free-form tags.
    pub tags: Vec<String>,
}

impl TestCase {
    /// A source test with no validations yet.
    pub fn source(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self::with_shape(name, input, TestShape::Source(ValidationMap::new()))
    }

    /// A flat test; `functions` is derived from the validation name.
    pub fn flat(
        name: impl Into<String>,
        input: impl Into<String>,
        validation: impl Into<FunctionId>,
        expected: ExpectedPayload,
    ) -> Self {
        let validation = validation.into();
        Self::with_shape(
            name,
            input,
            TestShape::Flat(FlatValidation {
                functions: vec![validation.clone()],
                validation,
                expected,
                args: Vec::new(),
                expect_error: false,
                source_test: None,
            }),
        )
    }

    fn with_shape(name: impl Into<String>, input: impl Into<String>, shape: TestShape) -> Self {
        Self {
            name: name.into(),
            inputs: vec![input.into()],
            shape,
            features: Vec::new(),
            behaviors: Vec::new(),
            variants: Vec::new(),
            conflicts: None,
            level: None,
            tags: Vec::new(),
        }
    }

    /// Add a validation slot. No-op on flat tests.
    #[must_use]
    pub fn with_validation(mut self, name: impl Into<FunctionId>, slot: ValidationSlot) -> Self {
        if let TestShape::Source(map) = &mut self.shape {
            map.insert(name, slot);
        }
        self
    }

    /// Set accessor args. No-op on source tests.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let TestShape::Flat(flat) = &mut self.shape {
            flat.args = args.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Set required features.
    #[must_use]
    pub fn with_features<I, F>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FeatureId>,
    {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Set required behaviours.
    #[must_use]
    pub fn with_behaviors<I, B>(mut self, behaviors: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<BehaviorId>,
    {
        self.behaviors = behaviors.into_iter().map(Into::into).collect();
        self
    }

    /// Set acceptable variants.
    #[must_use]
    pub fn with_variants<I, V>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<VariantId>,
    {
        self.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// Set conflicts; an empty set is stored as `None`.
    #[must_use]
    pub fn with_conflicts(mut self, conflicts: ConflictSet) -> Self {
        self.conflicts = conflicts.normalize();
        self
    }

    /// Set the legacy level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    /// `true` for single-validation tests.
    pub fn is_flat(&self) -> bool {
        matches!(self.shape, TestShape::Flat(_))
    }

    /// The flat validation, if flat-shaped.
    pub fn flat_validation(&self) -> Option<&FlatValidation> {
        match &self.shape {
            TestShape::Flat(flat) => Some(flat),
            TestShape::Source(_) => None,
        }
    }

    /// The validation map, if source-shaped.
    pub fn validations(&self) -> Option<&ValidationMap> {
        match &self.shape {
            TestShape::Source(map) => Some(map),
            TestShape::Flat(_) => None,
        }
    }

    /// The single validation name of a flat test.
    pub fn validation(&self) -> Option<&FunctionId> {
        self.flat_validation().map(|f| &f.validation)
    }

    /// Derived function metadata; empty for source tests.
    pub fn functions(&self) -> &[FunctionId] {
        self.flat_validation()
            .map(|f| f.functions.as_slice())
            .unwrap_or_default()
    }

    /// Every function name the test touches: the flat validation and its
    /// derived functions, or the source test's validation names.
    /// Deduplicated, in first-seen order.
    pub fn touched_functions(&self) -> Vec<&FunctionId> {
        let candidates: Vec<&FunctionId> = match &self.shape {
            TestShape::Flat(flat) => std::iter::once(&flat.validation)
                .chain(flat.functions.iter())
                .collect(),
            TestShape::Source(map) => map.names().collect(),
        };
        let mut out: Vec<&FunctionId> = Vec::with_capacity(candidates.len());
        for f in candidates {
            if !out.contains(&f) {
                out.push(f);
            }
        }
        out
    }

    /// Number of assertions: one for flat tests, one per slot for source
    /// tests.
    pub fn assertion_count(&self) -> usize {
        match &self.shape {
            TestShape::Flat(_) => 1,
            TestShape::Source(map) => map.len(),
        }
    }

    /// Back-reference to the source test, if derived.
    pub fn source_test(&self) -> Option<&str> {
        self.flat_validation()
            .and_then(|f| f.source_test.as_deref())
    }
}

impl JsonSchema for TestCase {
    fn schema_name() -> Cow<'static, str> {
        TestRecord::schema_name()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        TestRecord::json_schema(generator)
    }
}

// ---------------------------------------------------------------------------
// TestSuite
// ---------------------------------------------------------------------------

/// A file's worth of tests: the container encoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TestSuite {
    /// Optional schema reference.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Suite name.
    #[serde(default)]
    pub suite: String,
    /// Suite version.
    #[serde(default)]
    pub version: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The tests.
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// A suite with the given name and tests.
    pub fn new(suite: impl Into<String>, tests: Vec<TestCase>) -> Self {
        Self {
            suite: suite.into(),
            tests,
            ..Self::default()
        }
    }
}

impl TryFrom<Value> for TestCase {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let record: TestRecord =
            serde_json::from_value(value).map_err(|e| RecordError::Malformed {
                reason: e.to_string(),
            })?;
        Self::try_from(record)
    }
}
