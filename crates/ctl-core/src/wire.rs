// SPDX-License-Identifier: MIT OR Apache-2.0
//! On-disk record encoding.
//!
//! [`TestRecord`] is the one place where the many historical spellings of a
//! test are accepted: `input` / `input1..3` / `inputs`, a `validations` map
//! or a compact `tests` list, `expected` or `expect`, and missing lists.
//! Converting into [`TestCase`] normalises all of them; converting back
//! writes a single canonical spelling.

use crate::expected::ExpectedPayload;
use crate::ids::{BehaviorId, FeatureId, FunctionId, VariantId};
use crate::model::{ConflictSet, FlatValidation, TestCase, TestShape, ValidationMap, ValidationSlot};
use ctl_error::{CodedError, ErrorCode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// A test record that could not be normalised.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The record has no name.
    #[error("test record has no name")]
    MissingName,

    /// A validation slot is malformed.
    #[error("invalid validation '{validation}': {reason}")]
    InvalidSlot {
        /// Validation name.
        validation: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The record does not decode at all.
    #[error("malformed test record: {reason}")]
    Malformed {
        /// Decoder message.
        reason: String,
    },
}

impl CodedError for RecordError {
    fn code(&self) -> ErrorCode {
        ErrorCode::ParseInvalidRecord
    }
}

/// One entry of the compact `tests` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompactValidation {
    /// Validation name.
    pub function: FunctionId,
    /// Expected result.
    #[serde(default)]
    pub expect: Value,
    /// Accessor arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// The implementation is expected to fail.
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Every accepted on-disk spelling of a test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TestRecord {
    /// Test name.
    #[serde(default)]
    pub name: String,
    /// Single input document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Legacy first composition input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input1: Option<String>,
    /// Legacy second composition input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input2: Option<String>,
    /// Legacy third composition input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input3: Option<String>,
    /// Several input documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<String>>,

    /// Source shape: validation name → expected value or structured slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validations: Option<Map<String, Value>>,
    /// Source shape, compact spelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<CompactValidation>>,

    /// Flat shape: the single validation name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FunctionId>,
    /// Flat shape: expected result, shaped or raw.
    #[serde(default, alias = "expect", skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// Flat shape: accessor arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Flat shape: the implementation is expected to fail.
    #[serde(default, skip_serializing_if = "is_false")]
    pub expect_error: bool,
    /// Flat shape: functions exercised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionId>>,

    /// Required features.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<FeatureId>>,
    /// Required behaviour choices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behaviors: Option<Vec<BehaviorId>>,
    /// Acceptable variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<VariantId>>,
    /// Incompatible capability choices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<ConflictSet>,

    /// Legacy difficulty level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Legacy tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Flat shape: back-reference to the source test.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_test: Option<String>,
}

impl TestRecord {
    fn take_inputs(&mut self) -> Vec<String> {
        if let Some(inputs) = self.inputs.take() {
            return inputs;
        }
        [
            self.input.take(),
            self.input1.take(),
            self.input2.take(),
            self.input3.take(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn take_validations(&mut self) -> Result<ValidationMap, RecordError> {
        let mut map = ValidationMap::new();
        if let Some(validations) = self.validations.take() {
            for (name, value) in validations {
                let name = FunctionId::from(name);
                let slot = ValidationSlot::from_value(&name, value)?;
                map.insert(name, slot);
            }
        }
        for compact in self.tests.take().unwrap_or_default() {
            if map.get(compact.function.as_str()).is_some() {
                warn!(
                    target: "ctl.loader",
                    test = %self.name,
                    validation = %compact.function,
                    "duplicate validation in test; keeping the first"
                );
                continue;
            }
            let slot = ValidationSlot {
                expected: compact.expect,
                args: compact.args,
                expect_error: compact.error,
            };
            map.insert(compact.function, slot);
        }
        Ok(map)
    }
}

impl TryFrom<TestRecord> for TestCase {
    type Error = RecordError;

    fn try_from(mut record: TestRecord) -> Result<Self, Self::Error> {
        if record.name.is_empty() {
            return Err(RecordError::MissingName);
        }
        let inputs = record.take_inputs();

        let shape = match record.validation.take() {
            Some(validation) => {
                let expected = ExpectedPayload::from_flat(
                    &validation,
                    record.expected.take().unwrap_or(Value::Null),
                );
                TestShape::Flat(FlatValidation {
                    expected,
                    args: record.args.take().unwrap_or_default(),
                    expect_error: record.expect_error,
                    functions: record.functions.take().unwrap_or_default(),
                    source_test: record.source_test.take(),
                    validation,
                })
            }
            None => TestShape::Source(record.take_validations()?),
        };

        Ok(Self {
            name: record.name,
            inputs,
            shape,
            features: record.features.unwrap_or_default(),
            behaviors: record.behaviors.unwrap_or_default(),
            variants: record.variants.unwrap_or_default(),
            conflicts: record.conflicts.and_then(ConflictSet::normalize),
            level: record.level,
            tags: record.tags.unwrap_or_default(),
        })
    }
}

impl From<TestCase> for TestRecord {
    fn from(test: TestCase) -> Self {
        let mut record = TestRecord {
            name: test.name,
            features: Some(test.features),
            behaviors: Some(test.behaviors),
            variants: Some(test.variants),
            conflicts: test.conflicts.and_then(ConflictSet::normalize),
            level: test.level,
            tags: (!test.tags.is_empty()).then_some(test.tags),
            ..TestRecord::default()
        };

        let mut inputs = test.inputs;
        if inputs.len() == 1 {
            record.input = inputs.pop();
        } else if !inputs.is_empty() {
            record.inputs = Some(inputs);
        }

        match test.shape {
            TestShape::Source(map) => {
                let validations = map
                    .iter()
                    .map(|(name, slot)| (name.to_string(), slot.to_value()))
                    .collect();
                record.validations = Some(validations);
            }
            TestShape::Flat(flat) => {
                let typed = flat
                    .validation
                    .known()
                    .is_some_and(|f| f.is_typed_accessor());
                record.expected = Some(flat.expected.to_flat_value());
                record.args = typed.then_some(flat.args);
                record.expect_error = flat.expect_error;
                record.functions = Some(flat.functions);
                record.source_test = flat.source_test;
                record.validation = Some(flat.validation);
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expected::Entry;
    use serde_json::json;

    fn decode(v: Value) -> Result<TestCase, RecordError> {
        TestCase::try_from(v)
    }

    #[test]
    fn source_record_with_validations_map() {
        let t = decode(json!({
            "name": "basic",
            "input": "name = Alice",
            "validations": {
                "parse": [{"key": "name", "value": "Alice"}],
                "get_string": {"expect": "Alice", "args": ["name"]}
            },
            "features": ["comments"]
        }))
        .unwrap();
        let map = t.validations().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("get_string").unwrap().args, ["name"]);
        assert_eq!(t.inputs, ["name = Alice"]);
        assert_eq!(t.features, [FeatureId::from("comments")]);
        assert!(t.behaviors.is_empty());
    }

    #[test]
    fn compact_tests_list_is_accepted() {
        let t = decode(json!({
            "name": "compact",
            "input": "a = 1",
            "tests": [
                {"function": "parse", "expect": [{"key": "a", "value": "1"}]},
                {"function": "get_int", "expect": 1, "args": ["a"]},
                {"function": "parse", "expect": []}
            ]
        }))
        .unwrap();
        let map = t.validations().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("parse").unwrap().expected, json!([{"key": "a", "value": "1"}]));
    }

    #[test]
    fn legacy_numbered_inputs_are_collected_in_order() {
        let t = decode(json!({
            "name": "compose",
            "input1": "a = 1",
            "input2": "b = 2",
            "validations": {}
        }))
        .unwrap();
        assert_eq!(t.inputs, ["a = 1", "b = 2"]);
    }

    #[test]
    fn empty_input_is_preserved() {
        let t = decode(json!({"name": "empty", "input": "", "validations": {"parse": []}})).unwrap();
        assert_eq!(t.inputs, [""]);
    }

    #[test]
    fn flat_record_accepts_expect_alias() {
        let t = decode(json!({
            "name": "f",
            "input": "x = 1",
            "validation": "parse",
            "expect": {"count": 1, "entries": [{"key": "x", "value": "1"}]}
        }))
        .unwrap();
        let flat = t.flat_validation().unwrap();
        assert_eq!(flat.expected, ExpectedPayload::Entries(vec![Entry::new("x", "1")]));
        assert!(flat.functions.is_empty());
    }

    #[test]
    fn missing_name_is_an_error() {
        let err = decode(json!({"input": "x"})).unwrap_err();
        assert!(matches!(err, RecordError::MissingName));
        assert_eq!(err.code(), ErrorCode::ParseInvalidRecord);
    }

    #[test]
    fn empty_conflicts_are_dropped_on_read() {
        let t = decode(json!({
            "name": "c",
            "validations": {},
            "conflicts": {"behaviors": [], "variants": []}
        }))
        .unwrap();
        assert!(t.conflicts.is_none());
    }

    #[test]
    fn flat_encoding_keeps_empty_lists_and_omits_untyped_args() {
        let t = TestCase::flat("f_parse", "a = 1", "parse", ExpectedPayload::Entries(vec![]))
            .with_args(["ignored"]);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["features"], json!([]));
        assert_eq!(v["behaviors"], json!([]));
        assert_eq!(v["variants"], json!([]));
        assert_eq!(v["functions"], json!(["parse"]));
        assert!(v.get("args").is_none());
        assert!(v.get("conflicts").is_none());
        assert_eq!(v["expected"], json!({"count": 0, "entries": []}));
    }

    #[test]
    fn typed_accessor_encodes_args() {
        let t = TestCase::flat("f", "a = 1", "get_int", ExpectedPayload::Scalar(json!(1)))
            .with_args(["a"]);
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["args"], json!(["a"]));
    }

    #[test]
    fn multiple_inputs_encode_as_list() {
        let mut t = TestCase::source("s", "a = 1");
        t.inputs.push("b = 2".into());
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["inputs"], json!(["a = 1", "b = 2"]));
        assert!(v.get("input").is_none());
    }

    #[test]
    fn source_encoding_reads_back_identically() {
        let t = TestCase::source("s", "k = v")
            .with_validation("parse", ValidationSlot::new(json!([{"key": "k", "value": "v"}])))
            .with_validation("get_string", ValidationSlot::new(json!("v")).with_args(["k"]))
            .with_behaviors(["crlf_normalize_to_lf"])
            .with_conflicts(ConflictSet::variants(["reference_compliant"]));
        let text = serde_json::to_string(&t).unwrap();
        let back: TestCase = serde_json::from_str(&text).unwrap();
        assert_eq!(back, t);
    }
}
