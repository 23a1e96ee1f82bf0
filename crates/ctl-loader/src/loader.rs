// SPDX-License-Identifier: MIT OR Apache-2.0
//! [`TestLoader`]: directory loading bound to one implementation.

use crate::error::LoadError;
use crate::parse::{self, ErrorPolicy, TestFormat};
use crate::stats::{self, CapabilityCoverage, TestStatistics};
use ctl_capability::{CapabilityDeclaration, is_compatible};
use ctl_core::TestCase;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default source directory under the data root.
pub const SOURCE_DIR: &str = "tests";

/// Default flat directory under the data root.
pub const FLAT_DIR: &str = "generated-tests";

/// A caller-supplied test predicate.
pub type TestPredicate = Arc<dyn Fn(&TestCase) -> bool + Send + Sync>;

/// Which tests survive loading.
#[derive(Clone, Default)]
pub enum FilterMode {
    /// Only tests compatible with the loader's declaration.
    #[default]
    Compatible,
    /// Every test.
    All,
    /// Tests accepted by a caller predicate.
    Custom(TestPredicate),
}

impl fmt::Debug for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compatible => f.write_str("Compatible"),
            Self::All => f.write_str("All"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Options for one load call.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Which directory and decoder to use.
    pub format: TestFormat,
    /// Which tests survive.
    pub filter: FilterMode,
    /// Drop tests whose level exceeds this. Unlevelled tests always pass.
    pub level_limit: Option<u32>,
    /// Per-file failure handling.
    pub on_error: ErrorPolicy,
}

impl LoadOptions {
    /// Options for `format`, with the remaining defaults.
    pub fn new(format: TestFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Set the filter mode.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Set the level limit.
    #[must_use]
    pub fn with_level_limit(mut self, level: u32) -> Self {
        self.level_limit = Some(level);
        self
    }

    /// Set the per-file failure policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }
}

/// Loads tests from a data root and filters them for one implementation.
#[derive(Debug, Clone)]
pub struct TestLoader {
    source_dir: PathBuf,
    flat_dir: PathBuf,
    declaration: CapabilityDeclaration,
}

impl TestLoader {
    /// A loader over `root/tests` and `root/generated-tests`.
    ///
    /// The declaration is validated here, once.
    pub fn new(root: impl AsRef<Path>, declaration: CapabilityDeclaration) -> Result<Self, LoadError> {
        let root = root.as_ref();
        Self::with_dirs(root.join(SOURCE_DIR), root.join(FLAT_DIR), declaration)
    }

    /// A loader over explicit source and flat directories.
    pub fn with_dirs(
        source_dir: impl Into<PathBuf>,
        flat_dir: impl Into<PathBuf>,
        declaration: CapabilityDeclaration,
    ) -> Result<Self, LoadError> {
        declaration.validate()?;
        Ok(Self {
            source_dir: source_dir.into(),
            flat_dir: flat_dir.into(),
            declaration,
        })
    }

    /// The validated declaration.
    pub fn declaration(&self) -> &CapabilityDeclaration {
        &self.declaration
    }

    /// Directory holding `format` files.
    pub fn dir_for(&self, format: TestFormat) -> &Path {
        match format {
            TestFormat::Source => &self.source_dir,
            TestFormat::Flat => &self.flat_dir,
        }
    }

    fn keep(&self, test: &TestCase, opts: &LoadOptions) -> bool {
        if let (Some(limit), Some(level)) = (opts.level_limit, test.level) {
            if level > limit {
                return false;
            }
        }
        match &opts.filter {
            FilterMode::Compatible => is_compatible(&self.declaration, test),
            FilterMode::All => true,
            FilterMode::Custom(pred) => pred(test),
        }
    }

    fn apply(&self, tests: Vec<TestCase>, opts: &LoadOptions) -> Vec<TestCase> {
        let before = tests.len();
        let kept: Vec<TestCase> = tests.into_iter().filter(|t| self.keep(t, opts)).collect();
        debug!(
            target: "ctl.loader",
            filter = ?opts.filter,
            before,
            after = kept.len(),
            "filtered tests"
        );
        kept
    }

    /// Load one file and apply `opts`.
    pub fn load_file(&self, path: &Path, opts: &LoadOptions) -> Result<Vec<TestCase>, LoadError> {
        let suite = parse::load_file(path, opts.format)?;
        Ok(self.apply(suite.tests, opts))
    }

    /// Load every file of `opts.format` and apply `opts`.
    pub fn load_all_tests(&self, opts: &LoadOptions) -> Result<Vec<TestCase>, LoadError> {
        let loaded = parse::load_dir(self.dir_for(opts.format), opts.format, opts.on_error)?;
        Ok(self.apply(loaded.tests, opts))
    }

    /// [`load_all_tests`](Self::load_all_tests) with a level limit.
    pub fn load_tests_by_level(
        &self,
        max_level: u32,
        opts: &LoadOptions,
    ) -> Result<Vec<TestCase>, LoadError> {
        let opts = opts.clone().with_level_limit(max_level);
        self.load_all_tests(&opts)
    }

    /// Tests touching `function`, after `opts`.
    pub fn load_tests_by_function(
        &self,
        function: &str,
        opts: &LoadOptions,
    ) -> Result<Vec<TestCase>, LoadError> {
        let mut tests = self.load_all_tests(opts)?;
        tests.retain(|t| t.touched_functions().iter().any(|f| *f == function));
        Ok(tests)
    }

    /// The compatible subset of `tests`, in order.
    pub fn filter_compatible<'a>(&self, tests: &'a [TestCase]) -> Vec<&'a TestCase> {
        ctl_capability::filter_compatible(&self.declaration, tests)
    }

    /// Statistics against this loader's declaration.
    pub fn statistics(&self, tests: &[TestCase]) -> TestStatistics {
        stats::statistics(&self.declaration, tests)
    }

    /// Coverage of this loader's declared capabilities.
    pub fn capability_coverage(&self, tests: &[TestCase]) -> CapabilityCoverage {
        stats::capability_coverage(&self.declaration, tests)
    }
}

/// Tests carrying any of `include` (when non-empty) and none of `exclude`.
#[must_use]
pub fn filter_by_tags<'a>(
    tests: &'a [TestCase],
    include: &[&str],
    exclude: &[&str],
) -> Vec<&'a TestCase> {
    tests
        .iter()
        .filter(|t| {
            let has = |tag: &&str| t.tags.iter().any(|x| x == tag);
            (include.is_empty() || include.iter().any(has)) && !exclude.iter().any(has)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctl_core::ExpectedPayload;
    use serde_json::json;

    fn flat(name: &str, validation: &str) -> TestCase {
        TestCase::flat(name, "", validation, ExpectedPayload::Scalar(json!(1)))
    }

    fn loader() -> TestLoader {
        TestLoader::new(
            "/nonexistent",
            CapabilityDeclaration::new("impl", "1").with_functions(["parse"]),
        )
        .unwrap()
    }

    #[test]
    fn invalid_declaration_is_rejected_up_front() {
        let err = TestLoader::new(
            ".",
            CapabilityDeclaration::default().with_behaviors(["tabs_preserve", "tabs_to_spaces"]),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Declaration(_)));
    }

    #[test]
    fn default_dirs() {
        let l = loader();
        assert_eq!(l.dir_for(TestFormat::Source), Path::new("/nonexistent/tests"));
        assert_eq!(l.dir_for(TestFormat::Flat), Path::new("/nonexistent/generated-tests"));
    }

    #[test]
    fn missing_directory_loads_nothing() {
        let tests = loader().load_all_tests(&LoadOptions::default()).unwrap();
        assert!(tests.is_empty());
    }

    #[test]
    fn filter_modes() {
        let l = loader();
        let tests = vec![flat("a", "parse"), flat("b", "get_int").with_level(3)];
        let compat = l.apply(tests.clone(), &LoadOptions::default());
        assert_eq!(compat.len(), 1);
        let all = l.apply(
            tests.clone(),
            &LoadOptions::default().with_filter(FilterMode::All),
        );
        assert_eq!(all.len(), 2);
        let custom = l.apply(
            tests.clone(),
            &LoadOptions::default()
                .with_filter(FilterMode::Custom(Arc::new(|t: &TestCase| t.name == "b"))),
        );
        assert_eq!(custom.len(), 1);
        let limited = l.apply(
            tests,
            &LoadOptions::default()
                .with_filter(FilterMode::All)
                .with_level_limit(2),
        );
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].name, "a");
    }

    #[test]
    fn tag_filtering() {
        let mut a = flat("a", "parse");
        a.tags = vec!["basic".into()];
        let mut b = flat("b", "parse");
        b.tags = vec!["basic".into(), "slow".into()];
        let c = flat("c", "parse");
        let tests = vec![a, b, c];

        let names = |v: Vec<&TestCase>| v.iter().map(|t| t.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(filter_by_tags(&tests, &["basic"], &[])), ["a", "b"]);
        assert_eq!(names(filter_by_tags(&tests, &[], &["slow"])), ["a", "c"]);
        assert_eq!(names(filter_by_tags(&tests, &["basic"], &["slow"])), ["a"]);
    }

    #[test]
    fn filter_mode_debug_hides_closure() {
        let mode = FilterMode::Custom(Arc::new(|_: &TestCase| true));
        assert_eq!(format!("{mode:?}"), "Custom(..)");
    }
}
