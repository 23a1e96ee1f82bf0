// SPDX-License-Identifier: MIT OR Apache-2.0
//! Writing flat test files from a directory of source files.

use crate::expand::expand;
use ctl_core::{FLAT_FORMAT_SCHEMA, FunctionId, TestSuite};
use ctl_error::{CodedError, ErrorCode};
use ctl_glob::FileGlobs;
use ctl_loader::{ErrorPolicy, LoadError, TestFormat, load_dir, load_file};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Generation failures.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// A source file could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The source directory could not be listed.
    #[error("failed to list source files in {}: {reason}", dir.display())]
    Discover {
        /// Source directory.
        dir: PathBuf,
        /// Rendered cause chain.
        reason: String,
    },

    /// Output could not be written.
    #[error("failed to write {}", path.display())]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A suite could not be encoded.
    #[error("failed to encode {}", path.display())]
    Encode {
        /// Output path.
        path: PathBuf,
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },

    /// Generated output failed validation.
    #[error("generated output is invalid: {}", problems.join("; "))]
    InvalidOutput {
        /// One message per offending record.
        problems: Vec<String>,
    },
}

impl CodedError for GenerateError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Load(e) => e.code(),
            Self::Discover { .. } => ErrorCode::IoReadFailed,
            Self::Write { .. } => ErrorCode::IoWriteFailed,
            Self::Encode { .. } => ErrorCode::Internal,
            Self::InvalidOutput { .. } => ErrorCode::TransformInvalidOutput,
        }
    }
}

/// Which source files and validations to generate.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Skip `property-*.json` source files.
    pub skip_property_tests: bool,
    /// Never emit tests for these validations.
    pub skip_functions: BTreeSet<FunctionId>,
    /// When non-empty, emit tests for these validations only.
    pub only_functions: BTreeSet<FunctionId>,
}

impl GenerateOptions {
    fn admits(&self, validation: &FunctionId) -> bool {
        if self.skip_functions.contains(validation) {
            return false;
        }
        self.only_functions.is_empty() || self.only_functions.contains(validation)
    }
}

/// Per-file outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// Source file read.
    pub source: PathBuf,
    /// Flat file written.
    pub output: PathBuf,
    /// Tests in the source file.
    pub source_tests: usize,
    /// Flat tests written.
    pub flat_tests: usize,
    /// Derived tests dropped by the function filters.
    pub filtered: usize,
}

/// Outcome of a full generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    /// One entry per source file, in discovery order.
    pub files: Vec<FileSummary>,
}

impl GenerationSummary {
    /// Source tests read across all files.
    pub fn source_tests(&self) -> usize {
        self.files.iter().map(|f| f.source_tests).sum()
    }

    /// Flat tests written across all files.
    pub fn flat_tests(&self) -> usize {
        self.files.iter().map(|f| f.flat_tests).sum()
    }

    /// Derived tests dropped by the function filters.
    pub fn filtered(&self) -> usize {
        self.files.iter().map(|f| f.filtered).sum()
    }
}

/// Expand a source suite into its flat counterpart.
///
/// Returns the flat suite and the number of derived tests the options
/// dropped. Source tests without validations produce nothing.
pub fn flatten_suite(source: &TestSuite, options: &GenerateOptions) -> (TestSuite, usize) {
    let mut filtered = 0;
    let mut tests = Vec::new();
    for test in &source.tests {
        for derived in expand(test) {
            let Some(validation) = derived.validation() else {
                debug!(target: "ctl.generate", test = %derived.name, "source test has no validations");
                continue;
            };
            if options.admits(validation) {
                tests.push(derived);
            } else {
                filtered += 1;
            }
        }
    }
    let suite = TestSuite {
        schema: Some(FLAT_FORMAT_SCHEMA.to_string()),
        suite: source.suite.clone(),
        version: source.version.clone(),
        description: source
            .description
            .as_ref()
            .map(|d| format!("{d} (flat format)")),
        tests,
    };
    (suite, filtered)
}

/// Generates a directory of flat files from a directory of source files.
#[derive(Debug, Clone)]
pub struct FlatGenerator {
    source_dir: PathBuf,
    output_dir: PathBuf,
    options: GenerateOptions,
}

impl FlatGenerator {
    /// A generator with default options.
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            options: GenerateOptions::default(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Where output is written.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Source files that [`generate_all`](Self::generate_all) will read.
    pub fn source_files(&self) -> Result<Vec<PathBuf>, GenerateError> {
        FileGlobs::test_files(self.options.skip_property_tests)
            .and_then(|globs| globs.discover(&self.source_dir))
            .map_err(|e| GenerateError::Discover {
                dir: self.source_dir.clone(),
                reason: format!("{e:#}"),
            })
    }

    /// Generate one flat file per source file.
    ///
    /// Files are independent; the first failure stops the run.
    pub fn generate_all(&self) -> Result<GenerationSummary, GenerateError> {
        let sources = self.source_files()?;
        std::fs::create_dir_all(&self.output_dir).map_err(|source| GenerateError::Write {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut summary = GenerationSummary::default();
        for source in sources {
            summary.files.push(self.generate_file(&source)?);
        }
        info!(
            target: "ctl.generate",
            files = summary.files.len(),
            source_tests = summary.source_tests(),
            flat_tests = summary.flat_tests(),
            filtered = summary.filtered(),
            "generated flat tests"
        );
        Ok(summary)
    }

    /// Generate the flat counterpart of one source file into the output
    /// directory, under the same file name.
    pub fn generate_file(&self, source: &Path) -> Result<FileSummary, GenerateError> {
        let suite = load_file(source, TestFormat::Source)?;
        let (flat, filtered) = flatten_suite(&suite, &self.options);

        let output = self
            .output_dir
            .join(source.file_name().unwrap_or(source.as_os_str()));
        let mut bytes = serde_json::to_vec_pretty(&flat).map_err(|e| GenerateError::Encode {
            path: output.clone(),
            source: e,
        })?;
        bytes.push(b'\n');
        std::fs::write(&output, bytes).map_err(|e| GenerateError::Write {
            path: output.clone(),
            source: e,
        })?;

        debug!(
            target: "ctl.generate",
            source = %source.display(),
            output = %output.display(),
            source_tests = suite.tests.len(),
            flat_tests = flat.tests.len(),
            "wrote flat file"
        );
        Ok(FileSummary {
            source: source.to_path_buf(),
            output,
            source_tests: suite.tests.len(),
            flat_tests: flat.tests.len(),
            filtered,
        })
    }

    /// Re-read the output directory and check every record is a flat test
    /// with an expected payload. Returns the number of tests checked.
    pub fn validate_generated(&self) -> Result<usize, GenerateError> {
        let loaded = load_dir(&self.output_dir, TestFormat::Flat, ErrorPolicy::FailFast)?;
        let mut problems = Vec::new();
        for test in &loaded.tests {
            match test.flat_validation() {
                None => problems.push(format!("{}: record has no validation", test.name)),
                Some(flat) if flat.expected.to_raw_value().is_null() && !flat.expect_error => {
                    problems.push(format!("{}: record has no expected payload", test.name));
                }
                Some(_) => {}
            }
        }
        if problems.is_empty() {
            Ok(loaded.tests.len())
        } else {
            Err(GenerateError::InvalidOutput { problems })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctl_core::{TestCase, ValidationSlot};
    use serde_json::json;

    fn ids(names: &[&str]) -> BTreeSet<FunctionId> {
        names.iter().map(|n| FunctionId::from(*n)).collect()
    }

    fn source_suite() -> TestSuite {
        TestSuite {
            description: Some("Core API".into()),
            ..TestSuite::new(
                "CCL",
                vec![
                    TestCase::source("kv", "a = 1")
                        .with_validation("parse", ValidationSlot::new(json!([{"key": "a", "value": "1"}])))
                        .with_validation("build_hierarchy", ValidationSlot::new(json!({"a": "1"})))
                        .with_validation("get_int", ValidationSlot::new(json!(1)).with_args(["a"])),
                ],
            )
        }
    }

    #[test]
    fn flatten_marks_the_suite_as_flat() {
        let (flat, filtered) = flatten_suite(&source_suite(), &GenerateOptions::default());
        assert_eq!(flat.schema.as_deref(), Some(FLAT_FORMAT_SCHEMA));
        assert_eq!(flat.description.as_deref(), Some("Core API (flat format)"));
        assert_eq!(flat.suite, "CCL");
        assert_eq!(flat.tests.len(), 3);
        assert_eq!(filtered, 0);
    }

    #[test]
    fn only_functions_restricts_output() {
        let options = GenerateOptions {
            only_functions: ids(&["parse"]),
            ..GenerateOptions::default()
        };
        let (flat, filtered) = flatten_suite(&source_suite(), &options);
        assert_eq!(flat.tests.len(), 1);
        assert_eq!(filtered, 2);
    }

    #[test]
    fn skip_functions_wins_over_only_functions() {
        let options = GenerateOptions {
            only_functions: ids(&["parse", "get_int"]),
            skip_functions: ids(&["parse"]),
            ..GenerateOptions::default()
        };
        let (flat, _) = flatten_suite(&source_suite(), &options);
        let names: Vec<&str> = flat.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["kv_get_int"]);
    }

    #[test]
    fn error_codes() {
        let err = GenerateError::InvalidOutput {
            problems: vec!["x: record has no validation".into()],
        };
        assert_eq!(err.code(), ErrorCode::TransformInvalidOutput);
        assert_eq!(
            err.to_string(),
            "generated output is invalid: x: record has no validation"
        );
    }
}
