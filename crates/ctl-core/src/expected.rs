// SPDX-License-Identifier: MIT OR Apache-2.0
//! Expected-result payloads.
//!
//! A validation's expected value is untyped JSON on disk; its meaning depends
//! on the validation name. [`ExpectedPayload::shape`] is the single place
//! that turns `(validation, raw JSON)` into a typed payload. Flat files carry
//! the shaped form:
//!
//! ```json
//! { "count": 2, "entries": [{ "key": "a", "value": "1" }, { "key": "b", "value": "2" }] }
//! ```

use crate::ids::FunctionId;
use crate::vocab::PayloadFamily;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

/// One key/value pair produced by parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Entry {
    /// Entry key.
    pub key: String,
    /// Entry value.
    pub value: String,
}

impl Entry {
    /// Convenience constructor.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The expected result of one validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedPayload {
    /// Parsing, filtering and key-expansion results.
    Entries(Vec<Entry>),
    /// Hierarchy construction result.
    Object(Map<String, Value>),
    /// Typed scalar access result.
    Scalar(Value),
    /// Typed list access result.
    List(Vec<Value>),
    /// The validation kind was not recognised, or the raw value did not fit
    /// the kind's shape; carried through as a single value.
    Unrecognized(Value),
}

const SHAPED_KEYS: [&str; 6] = ["count", "entries", "object", "value", "list", "error"];

impl ExpectedPayload {
    /// Shape a raw expected value according to the validation it belongs to.
    ///
    /// Never fails: values that do not fit degrade to
    /// [`ExpectedPayload::Unrecognized`] with a warning.
    pub fn shape(validation: &FunctionId, raw: Value) -> Self {
        let Some(family) = validation.known().map(|f| f.payload_family()) else {
            warn!(
                target: "ctl.payload",
                validation = %validation,
                "unrecognised validation kind; expected payload kept as a single value"
            );
            return Self::Unrecognized(raw);
        };

        match (family, raw) {
            (PayloadFamily::Entries, Value::Array(items)) => {
                Self::Entries(entries_from_items(validation, items))
            }
            (PayloadFamily::Object, Value::Object(map)) => Self::Object(map),
            (PayloadFamily::List, Value::Array(items)) => Self::List(items),
            (PayloadFamily::Scalar, raw) => Self::Scalar(raw),
            (_, Value::Null) => {
                debug!(target: "ctl.payload", validation = %validation, "no expected value");
                Self::Unrecognized(Value::Null)
            }
            (family, raw) => {
                warn!(
                    target: "ctl.payload",
                    validation = %validation,
                    ?family,
                    "expected value does not match the validation's shape"
                );
                Self::Unrecognized(raw)
            }
        }
    }

    /// Decode an `expected` field read from a flat file.
    ///
    /// Accepts both the shaped form written by the generator and a raw
    /// value, which is shaped via [`ExpectedPayload::shape`].
    pub fn from_flat(validation: &FunctionId, value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::shape(validation, value);
        };
        let is_shaped = map.get("count").is_some_and(Value::is_u64)
            && map.keys().all(|k| SHAPED_KEYS.contains(&k.as_str()));
        if !is_shaped {
            return Self::shape(validation, Value::Object(map));
        }

        let family = validation.known().map(|f| f.payload_family());
        if let Some(entries) = map.remove("entries") {
            return Self::shape(validation, entries);
        }
        if let Some(list) = map.remove("list") {
            return Self::shape(validation, list);
        }
        if let Some(object) = map.remove("object") {
            return Self::shape(validation, object);
        }
        if let Some(value) = map.remove("value") {
            return match family {
                Some(PayloadFamily::Scalar) => Self::Scalar(value),
                _ => Self::Unrecognized(value),
            };
        }
        // Only a count: the shaped writer emits empty collections explicitly,
        // but older generators omitted them.
        match family {
            Some(PayloadFamily::Entries) => Self::Entries(Vec::new()),
            Some(PayloadFamily::List) => Self::List(Vec::new()),
            Some(PayloadFamily::Object) => Self::Object(Map::new()),
            _ => Self::Unrecognized(Value::Null),
        }
    }

    /// Number of items the payload asserts on.
    pub fn count(&self) -> usize {
        match self {
            Self::Entries(e) => e.len(),
            Self::List(l) => l.len(),
            Self::Object(_) | Self::Scalar(_) | Self::Unrecognized(_) => 1,
        }
    }

    /// The shaped JSON written to flat files.
    pub fn to_flat_value(&self) -> Value {
        match self {
            Self::Entries(entries) => json!({ "count": entries.len(), "entries": entries }),
            Self::Object(map) => json!({ "count": 1, "object": map }),
            Self::Scalar(v) | Self::Unrecognized(v) => json!({ "count": 1, "value": v }),
            Self::List(items) => json!({ "count": items.len(), "list": items }),
        }
    }

    /// The unshaped JSON value, as an author would write it in a source file.
    pub fn to_raw_value(&self) -> Value {
        match self {
            Self::Entries(entries) => serde_json::to_value(entries).unwrap_or(Value::Null),
            Self::Object(map) => Value::Object(map.clone()),
            Self::Scalar(v) | Self::Unrecognized(v) => v.clone(),
            Self::List(items) => Value::Array(items.clone()),
        }
    }
}

fn entries_from_items(validation: &FunctionId, items: Vec<Value>) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<Entry>(item) {
            Ok(entry) => entries.push(entry),
            Err(err) => warn!(
                target: "ctl.payload",
                validation = %validation,
                error = %err,
                "dropping malformed entry"
            ),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> FunctionId {
        FunctionId::from(s)
    }

    #[test]
    fn parse_shapes_to_entries() {
        let p = ExpectedPayload::shape(
            &id("parse"),
            json!([{"key": "name", "value": "John"}, {"key": "age", "value": "30"}]),
        );
        assert_eq!(
            p,
            ExpectedPayload::Entries(vec![Entry::new("name", "John"), Entry::new("age", "30")])
        );
        assert_eq!(p.count(), 2);
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let p = ExpectedPayload::shape(
            &id("filter"),
            json!([{"key": "a", "value": "1"}, {"key": 7}, "junk"]),
        );
        assert_eq!(p, ExpectedPayload::Entries(vec![Entry::new("a", "1")]));
    }

    #[test]
    fn hierarchy_shapes_to_object() {
        let p = ExpectedPayload::shape(&id("build_hierarchy"), json!({"a": {"b": "c"}}));
        assert!(matches!(p, ExpectedPayload::Object(ref m) if m.contains_key("a")));
        assert_eq!(p.count(), 1);
    }

    #[test]
    fn typed_access_shapes_to_scalar_and_list() {
        assert_eq!(
            ExpectedPayload::shape(&id("get_int"), json!(30)),
            ExpectedPayload::Scalar(json!(30))
        );
        assert_eq!(
            ExpectedPayload::shape(&id("get_list"), json!(["a", "b"])),
            ExpectedPayload::List(vec![json!("a"), json!("b")])
        );
    }

    #[test]
    fn unknown_validation_degrades_to_single_value() {
        let p = ExpectedPayload::shape(&id("frobnicate"), json!([1, 2]));
        assert_eq!(p, ExpectedPayload::Unrecognized(json!([1, 2])));
        assert_eq!(p.count(), 1);
    }

    #[test]
    fn mismatched_shape_degrades() {
        let p = ExpectedPayload::shape(&id("get_list"), json!("not a list"));
        assert_eq!(p, ExpectedPayload::Unrecognized(json!("not a list")));
    }

    #[test]
    fn flat_value_layout() {
        let p = ExpectedPayload::Entries(vec![Entry::new("k", "v")]);
        assert_eq!(
            p.to_flat_value(),
            json!({"count": 1, "entries": [{"key": "k", "value": "v"}]})
        );
        assert_eq!(
            ExpectedPayload::List(vec![]).to_flat_value(),
            json!({"count": 0, "list": []})
        );
        assert_eq!(
            ExpectedPayload::Scalar(json!(true)).to_flat_value(),
            json!({"count": 1, "value": true})
        );
    }

    #[test]
    fn from_flat_reads_shaped_and_raw() {
        let shaped = json!({"count": 1, "value": 42});
        assert_eq!(
            ExpectedPayload::from_flat(&id("get_int"), shaped),
            ExpectedPayload::Scalar(json!(42))
        );
        let raw = json!([{"key": "key", "value": "value"}]);
        assert_eq!(
            ExpectedPayload::from_flat(&id("parse"), raw),
            ExpectedPayload::Entries(vec![Entry::new("key", "value")])
        );
    }

    #[test]
    fn from_flat_count_only_yields_empty_collection() {
        assert_eq!(
            ExpectedPayload::from_flat(&id("parse"), json!({"count": 0})),
            ExpectedPayload::Entries(vec![])
        );
    }

    #[test]
    fn load_and_combine_carry_entry_lists() {
        for validation in ["load", "combine"] {
            let raw = json!([{"key": "a", "value": "1"}, {"key": "b", "value": "2"}]);
            let shaped = ExpectedPayload::shape(&id(validation), raw);
            let written = shaped.to_flat_value();
            assert_eq!(written["count"], 2, "{validation}");
            assert!(written["entries"].is_array(), "{validation}");
            assert_eq!(ExpectedPayload::from_flat(&id(validation), written), shaped);
        }
        // A single value is not an entry list for these validations.
        assert_eq!(
            ExpectedPayload::from_flat(&id("load"), json!({"count": 1, "value": "a = 1"})),
            ExpectedPayload::Unrecognized(json!("a = 1"))
        );
    }

    #[test]
    fn hierarchy_object_with_count_key_is_not_mistaken_for_shaped() {
        let raw = json!({"count": 3, "name": "x"});
        assert_eq!(
            ExpectedPayload::from_flat(&id("build_hierarchy"), raw.clone()),
            ExpectedPayload::Object(raw.as_object().unwrap().clone())
        );
    }

    #[test]
    fn raw_value_round_trips_through_shape() {
        for (validation, raw) in [
            ("parse", json!([{"key": "a", "value": "b"}])),
            ("build_hierarchy", json!({"a": "b"})),
            ("get_float", json!(1.5)),
            ("get_list", json!(["x"])),
        ] {
            let p = ExpectedPayload::shape(&id(validation), raw.clone());
            assert_eq!(p.to_raw_value(), raw, "{validation}");
        }
    }
}
