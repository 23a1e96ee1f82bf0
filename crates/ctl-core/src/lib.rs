// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! ctl-core
//!
//! The canonical model of a CCL conformance test.
//!
//! Tests come in two shapes. *Source* tests carry many validations over one
//! input and are what humans maintain; *flat* tests carry exactly one
//! validation and are what implementations consume. Both are
//! [`TestCase`]s; [`TestShape`] says which.
//!
//! Capability names are open-ended strings ([`FunctionId`], [`FeatureId`],
//! [`BehaviorId`], [`VariantId`]); the closed vocabulary this crate knows
//! about is in [`vocab`].

pub mod expected;
pub mod ids;
pub mod model;
pub mod vocab;
pub mod wire;

pub use expected::{Entry, ExpectedPayload};
pub use ids::{BehaviorId, FeatureId, FunctionId, VariantId};
pub use model::{
    ConflictSet, FLAT_FORMAT_SCHEMA, FlatValidation, TestCase, TestShape, TestSuite,
    ValidationMap, ValidationSlot,
};
pub use vocab::{Behavior, BehaviorGroup, Feature, Function, PayloadFamily, Variant};
pub use wire::{CompactValidation, RecordError, TestRecord};
