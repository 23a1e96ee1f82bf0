// SPDX-License-Identifier: MIT OR Apache-2.0
//! Glob-based selection of test files inside a directory.
//!
//! Patterns match the file name only; discovery never descends into
//! subdirectories.

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Every test file, source or flat.
pub const TEST_FILE_PATTERN: &str = "*.json";

/// Property-based source files, skippable during generation.
pub const PROPERTY_TEST_PATTERN: &str = "property-*.json";

/// Why a file name was or was not picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// Picked up.
    Allowed,
    /// Matched an exclude pattern.
    DeniedByExclude,
    /// Include patterns exist and none matched.
    DeniedByMissingInclude,
}

impl MatchDecision {
    /// Whether the file is picked up.
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }
}

/// Compiled include/exclude rules for test file names.
///
/// Exclusion wins over inclusion. An empty include list admits every name.
#[derive(Debug, Clone)]
pub struct FileGlobs {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl FileGlobs {
    /// Compile include and exclude pattern lists.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = compile(include).context("compile include patterns")?;
        let exclude = compile(exclude).context("compile exclude patterns")?;
        Ok(Self { include, exclude })
    }

    /// All `*.json` files, optionally without `property-*.json`.
    pub fn test_files(skip_property_tests: bool) -> Result<Self> {
        let exclude = if skip_property_tests {
            vec![PROPERTY_TEST_PATTERN.to_string()]
        } else {
            Vec::new()
        };
        Self::new(&[TEST_FILE_PATTERN.to_string()], &exclude)
    }

    /// Evaluate a bare file name.
    pub fn decide(&self, file_name: &str) -> MatchDecision {
        if self
            .exclude
            .as_ref()
            .is_some_and(|set| set.is_match(file_name))
        {
            return MatchDecision::DeniedByExclude;
        }
        if self
            .include
            .as_ref()
            .is_some_and(|set| !set.is_match(file_name))
        {
            return MatchDecision::DeniedByMissingInclude;
        }
        MatchDecision::Allowed
    }

    /// List matching regular files directly inside `dir`, sorted by path.
    ///
    /// A missing directory yields an empty list: no tests yet is a valid
    /// state.
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            debug!(target: "ctl.loader", dir = %dir.display(), "test directory does not exist");
            return Ok(Vec::new());
        }
        let listing = std::fs::read_dir(dir)
            .with_context(|| format!("read test directory {}", dir.display()))?;

        let mut picked = Vec::new();
        for entry in listing {
            let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match self.decide(name) {
                MatchDecision::Allowed => picked.push(path),
                decision => {
                    debug!(target: "ctl.loader", file = %name, ?decision, "skipping file")
                }
            }
        }
        picked.sort();
        Ok(picked)
    }
}

/// `None` for an empty list, so an absent rule never matches or rejects.
fn compile(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let set = patterns
        .iter()
        .try_fold(GlobSetBuilder::new(), |mut builder, pattern| {
            let glob = Glob::new(pattern).with_context(|| format!("invalid glob: {pattern}"))?;
            builder.add(glob);
            anyhow::Ok(builder)
        })?
        .build()?;
    Ok(Some(set))
}
