// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared command implementations for the `ctl` CLI.
//!
//! These functions are library-level so they can be tested without
//! spawning the binary.

use anyhow::{Context, Result};
use ctl_capability::{CapabilityDeclaration, CapabilityError};
use ctl_config::{
    ConfigError, ConfigWarning, ToolConfig, load_config, load_declaration, validate_config,
};
use ctl_core::{FunctionId, RecordError, TestCase};
use ctl_error::{CodedError, CtlError, ErrorCode};
use ctl_loader::{
    CapabilityCoverage, ErrorPolicy, FilterMode, LoadError, LoadOptions, TestFormat, TestLoader,
    TestStatistics,
};
use ctl_transform::{FlatGenerator, GenerateError, GenerateOptions, GenerationSummary};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Arguments for the `generate` command.
#[derive(Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Source directory; the configured one when `None`.
    pub source: Option<PathBuf>,
    /// Output directory; the configured one when `None`.
    pub out: Option<PathBuf>,
    /// Skip `property-*.json` files.
    pub skip_property_tests: bool,
    /// Validations never to emit.
    pub skip_functions: Vec<String>,
    /// Validations to emit exclusively.
    pub only_functions: Vec<String>,
    /// Re-read and check the output afterwards.
    pub validate: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    /// Which directory to read.
    pub format: TestFormat,
    /// Only tests touching this function.
    pub function: Option<String>,
    /// Skip compatibility filtering.
    pub all: bool,
    /// Drop tests above this level.
    pub level: Option<u32>,
    /// Continue past unreadable files.
    pub lenient: bool,
}

/// Load the tool configuration from an optional TOML file plus the
/// environment.
pub fn resolve_config(path: Option<&Path>) -> Result<ToolConfig> {
    match path {
        Some(p) => load_config(Some(p))
            .with_context(|| format!("load configuration '{}'", p.display())),
        None => load_config(None).context("load default configuration"),
    }
}

/// Validate `config`, logging advisory warnings and failing on hard errors.
pub fn log_config_warnings(config: &ToolConfig) -> Result<()> {
    for warning in check_config(config)? {
        warn!(target: "ctl.config", "{warning}");
    }
    Ok(())
}

/// The declaration to filter with: an explicit file wins over the
/// configured implementation. Without either, nothing is declared.
pub fn resolve_declaration(
    config: &ToolConfig,
    declaration: Option<&Path>,
) -> Result<CapabilityDeclaration> {
    if let Some(path) = declaration {
        return load_declaration(path)
            .with_context(|| format!("load declaration '{}'", path.display()));
    }
    match &config.implementation {
        Some(decl) => Ok(decl.clone()),
        None => {
            warn!(target: "ctl.config", "no implementation declared; no flat test is compatible");
            Ok(CapabilityDeclaration::default())
        }
    }
}

fn loader(config: &ToolConfig, decl: CapabilityDeclaration) -> Result<TestLoader> {
    TestLoader::with_dirs(config.source_path(), config.flat_path(), decl)
        .context("invalid capability declaration")
}

/// Run the generator and optionally validate its output.
pub fn generate(config: &ToolConfig, args: &GenerateArgs) -> Result<GenerationSummary> {
    let source = args.source.clone().unwrap_or_else(|| config.source_path());
    let out = args.out.clone().unwrap_or_else(|| config.flat_path());
    let ids = |names: &[String]| -> BTreeSet<FunctionId> {
        names.iter().map(|f| FunctionId::from(f.as_str())).collect()
    };
    let options = GenerateOptions {
        skip_property_tests: args.skip_property_tests,
        skip_functions: ids(&args.skip_functions),
        only_functions: ids(&args.only_functions),
    };

    let generator = FlatGenerator::new(&source, &out).with_options(options);
    let summary = generator.generate_all().with_context(|| {
        format!(
            "generate flat tests from '{}' into '{}'",
            source.display(),
            out.display()
        )
    })?;
    if args.validate {
        let checked = generator
            .validate_generated()
            .with_context(|| format!("validate generated tests in '{}'", out.display()))?;
        info!(target: "ctl.generate", checked, "generated output is valid");
    }
    Ok(summary)
}

/// Load and filter tests for listing.
pub fn list(
    config: &ToolConfig,
    decl: CapabilityDeclaration,
    args: &ListArgs,
) -> Result<Vec<TestCase>> {
    let loader = loader(config, decl)?;
    let mut opts = LoadOptions::new(args.format);
    if args.all {
        opts = opts.with_filter(FilterMode::All);
    }
    if let Some(level) = args.level {
        opts = opts.with_level_limit(level);
    }
    if args.lenient {
        opts = opts.with_error_policy(ErrorPolicy::SkipInvalid);
    }
    let dir = loader.dir_for(args.format).display().to_string();
    let tests = match &args.function {
        Some(f) => loader.load_tests_by_function(f, &opts),
        None => loader.load_all_tests(&opts),
    }
    .with_context(|| format!("load {} tests from '{dir}'", args.format))?;
    Ok(tests)
}

/// Statistics and coverage over every test in one directory.
pub fn stats(
    config: &ToolConfig,
    decl: CapabilityDeclaration,
    format: TestFormat,
) -> Result<(TestStatistics, CapabilityCoverage)> {
    let loader = loader(config, decl)?;
    let opts = LoadOptions::new(format).with_filter(FilterMode::All);
    let tests = loader
        .load_all_tests(&opts)
        .with_context(|| format!("load {format} tests from '{}'", loader.dir_for(format).display()))?;
    Ok((loader.statistics(&tests), loader.capability_coverage(&tests)))
}

/// Validate a loaded configuration, returning its warnings.
pub fn check_config(config: &ToolConfig) -> Result<Vec<ConfigWarning>> {
    validate_config(config).context("configuration is invalid")
}

/// The code of the first workspace error in `err`'s cause chain, or
/// [`ErrorCode::Internal`].
pub fn error_code(err: &anyhow::Error) -> ErrorCode {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<LoadError>()
                .map(|e| e.code())
                .or_else(|| cause.downcast_ref::<GenerateError>().map(|e| e.code()))
                .or_else(|| cause.downcast_ref::<ConfigError>().map(|e| e.code()))
                .or_else(|| cause.downcast_ref::<CapabilityError>().map(|e| e.code()))
                .or_else(|| cause.downcast_ref::<RecordError>().map(|e| e.code()))
        })
        .unwrap_or(ErrorCode::Internal)
}

/// Flatten a command failure into a coded [`CtlError`] whose message is
/// the whole context chain.
pub fn to_ctl_error(err: &anyhow::Error) -> CtlError {
    CtlError::new(error_code(err), format!("{err:#}"))
}
