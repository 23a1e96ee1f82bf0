// SPDX-License-Identifier: MIT OR Apache-2.0
//! File-level ingestion.
//!
//! Flat files come in two encodings: a container object wrapping `tests`,
//! or a bare array of records. The container is tried first; the bare
//! array only when the container yields no tests. Source files are always
//! containers.

use crate::error::LoadError;
use ctl_core::{TestCase, TestSuite};
use ctl_error::CodedError;
use ctl_glob::FileGlobs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which shape a file or directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestFormat {
    /// Multi-validation, human-maintained tests.
    Source,
    /// Single-validation, generated tests.
    #[default]
    Flat,
}

impl fmt::Display for TestFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Flat => "flat",
        })
    }
}

/// What to do when one file in a directory fails to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the whole directory load.
    #[default]
    FailFast,
    /// Log, record the failure, and continue with the next file. Errors
    /// whose code is fatal still abort.
    SkipInvalid,
}

impl ErrorPolicy {
    /// Whether a load under this policy records `err` and moves on.
    pub fn skips(self, err: &impl CodedError) -> bool {
        self == Self::SkipInvalid && !err.code().is_fatal()
    }
}

/// The result of loading a directory.
#[derive(Debug, Default)]
pub struct DirectoryLoad {
    /// Tests from every successfully loaded file, in file then record order.
    pub tests: Vec<TestCase>,
    /// Files loaded successfully.
    pub files_loaded: usize,
    /// Files skipped under [`ErrorPolicy::SkipInvalid`].
    pub failures: Vec<LoadError>,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode flat test content.
pub fn parse_flat(path: &Path, bytes: &[u8]) -> Result<TestSuite, LoadError> {
    let value = decode(path, bytes)?;

    let container = match &value {
        Value::Object(_) => Some(TestSuite::deserialize(&value)),
        _ => None,
    };
    let container_err = match container {
        Some(Ok(suite)) if !suite.tests.is_empty() => return Ok(suite),
        Some(Ok(empty)) => Ok(empty),
        Some(Err(e)) => Err(e),
        None => Ok(TestSuite::default()),
    };

    let suite = match Vec::<TestCase>::deserialize(&value) {
        Ok(tests) => Ok(TestSuite {
            tests,
            ..TestSuite::default()
        }),
        Err(bare_err) => match (container_err, value.is_array()) {
            (Ok(empty), false) => Ok(empty),
            (Err(e), false) => Err(parse_error(path, e)),
            (_, true) => Err(parse_error(path, bare_err)),
        },
    }?;
    reject_scalars(path, &value, suite)
}

fn reject_scalars(path: &Path, value: &Value, suite: TestSuite) -> Result<TestSuite, LoadError> {
    if value.is_object() || value.is_array() {
        Ok(suite)
    } else {
        Err(LoadError::UnexpectedShape {
            path: path.to_path_buf(),
            expected: "a container object or an array of tests",
            found: kind_of(value),
        })
    }
}

/// Decode source test content: always a container object.
pub fn parse_source(path: &Path, bytes: &[u8]) -> Result<TestSuite, LoadError> {
    let value = decode(path, bytes)?;
    if !value.is_object() {
        return Err(LoadError::UnexpectedShape {
            path: path.to_path_buf(),
            expected: "a container object",
            found: kind_of(&value),
        });
    }
    TestSuite::deserialize(&value).map_err(|e| parse_error(path, e))
}

fn decode(path: &Path, bytes: &[u8]) -> Result<Value, LoadError> {
    serde_json::from_slice(bytes).map_err(|e| parse_error(path, e))
}

fn parse_error(path: &Path, source: serde_json::Error) -> LoadError {
    LoadError::Parse {
        path: path.to_path_buf(),
        source,
    }
}

/// Read and decode one file.
pub fn load_file(path: &Path, format: TestFormat) -> Result<TestSuite, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let suite = match format {
        TestFormat::Flat => parse_flat(path, &bytes)?,
        TestFormat::Source => parse_source(path, &bytes)?,
    };
    debug!(
        target: "ctl.loader",
        path = %path.display(),
        %format,
        tests = suite.tests.len(),
        "loaded test file"
    );
    Ok(suite)
}

/// The `*.json` files directly inside `dir`, sorted.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    FileGlobs::test_files(false)
        .and_then(|globs| globs.discover(dir))
        .map_err(|e| LoadError::Discover {
            dir: dir.to_path_buf(),
            reason: format!("{e:#}"),
        })
}

/// Load every test file in `dir` and concatenate the tests.
///
/// A missing or empty directory is an empty, successful load.
pub fn load_dir(dir: &Path, format: TestFormat, policy: ErrorPolicy) -> Result<DirectoryLoad, LoadError> {
    let mut out = DirectoryLoad::default();
    for path in discover(dir)? {
        match load_file(&path, format) {
            Ok(suite) => {
                out.files_loaded += 1;
                out.tests.extend(suite.tests);
            }
            Err(err) if policy.skips(&err) => {
                warn!(target: "ctl.loader", error = %err, "skipping invalid test file");
                out.failures.push(err);
            }
            Err(err) => return Err(err),
        }
    }
    info!(
        target: "ctl.loader",
        dir = %dir.display(),
        %format,
        files = out.files_loaded,
        skipped = out.failures.len(),
        tests = out.tests.len(),
        "loaded test directory"
    );
    Ok(out)
}
