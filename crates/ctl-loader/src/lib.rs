// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! ctl-loader
//!
//! Reads source and flat test files, filters them for one implementation,
//! and summarises what is there.
//!
//! The free functions ([`load_file`], [`load_dir`]) are format-level
//! ingestion; [`TestLoader`] binds a data root and a validated
//! [`ctl_capability::CapabilityDeclaration`] for repeated queries.

pub mod error;
pub mod loader;
pub mod parse;
pub mod stats;

pub use error::LoadError;
pub use loader::{
    FLAT_DIR, FilterMode, LoadOptions, SOURCE_DIR, TestLoader, TestPredicate, filter_by_tags,
};
pub use parse::{
    DirectoryLoad, ErrorPolicy, TestFormat, discover, load_dir, load_file, parse_flat,
    parse_source,
};
pub use stats::{CapabilityCoverage, CoverageEntry, TestStatistics, capability_coverage, statistics};
