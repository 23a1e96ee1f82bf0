// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! ctl-transform
//!
//! Turns source tests into flat tests.
//!
//! [`expand`] is the pure, per-test transformation. [`FlatGenerator`] runs
//! it over a directory of source files and writes one flat file per source
//! file.

pub mod applicability;
pub mod expand;
pub mod generate;

pub use applicability::{affected_functions, applies_to, filter_behaviors};
pub use expand::{expand, expand_all};
pub use generate::{
    FileSummary, FlatGenerator, GenerateError, GenerateOptions, GenerationSummary, flatten_suite,
};
