// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the CCL test tooling.
//!
//! [`ToolConfig`] says where the test data lives and, optionally, which
//! implementation's [`CapabilityDeclaration`] to filter against. It is read
//! from TOML, overridden from `CTL_*` environment variables, and checked by
//! [`validate_config`], which separates hard errors from advisory
//! [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use ctl_capability::CapabilityDeclaration;
use ctl_error::{CodedError, ErrorCode};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a `ctl.toml` or declaration file was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested file was not found or could not be read.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// The path as given.
        path: String,
    },

    /// The file could not be parsed.
    #[error("failed to parse {path}: {reason}")]
    ParseError {
        /// File the content came from, or `<inline>`.
        path: String,
        /// The TOML parser's message.
        reason: String,
    },

    /// The file parsed but holds values the tool refuses.
    #[error("config validation failed: {}", reasons.join("; "))]
    ValidationError {
        /// One entry per rejected value.
        reasons: Vec<String>,
    },
}

impl CodedError for ConfigError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::FileNotFound { .. } => ErrorCode::ConfigNotFound,
            Self::ParseError { .. } => ErrorCode::ParseInvalidSyntax,
            Self::ValidationError { .. } => ErrorCode::ConfigInvalid,
        }
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Something worth telling the user that still lets the tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// An optional field was left out.
    MissingOptionalField {
        /// The field.
        field: String,
        /// What happens without it.
        hint: String,
    },
    /// An identifier is not part of the known vocabulary.
    UnknownIdentifier {
        /// `function`, `feature`, `behavior` or `variant`.
        kind: &'static str,
        /// The identifier as written.
        name: String,
    },
    /// The implementation declares no supported functions.
    NoSupportedFunctions,
    /// A feature is listed as both supported and unsupported.
    ContradictoryFeature {
        /// The feature.
        feature: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::UnknownIdentifier { kind, name } => {
                write!(f, "unknown {kind} '{name}'")
            }
            ConfigWarning::NoSupportedFunctions => {
                write!(f, "implementation supports no functions; every flat test will be filtered out")
            }
            ConfigWarning::ContradictoryFeature { feature } => {
                write!(f, "feature '{feature}' is both supported and unsupported; treated as unsupported")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level tool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ToolConfig {
    /// Root of the test data checkout. Relative directories below resolve
    /// against it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data_dir: Option<String>,

    /// Directory holding source (multi-validation) test files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,

    /// Directory holding generated flat test files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_dir: Option<String>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// The implementation to filter tests for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<CapabilityDeclaration>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            test_data_dir: None,
            source_dir: Some(DEFAULT_SOURCE_DIR.into()),
            flat_dir: Some(DEFAULT_FLAT_DIR.into()),
            log_level: Some("info".into()),
            implementation: None,
        }
    }
}

impl ToolConfig {
    fn root(&self) -> PathBuf {
        PathBuf::from(self.test_data_dir.as_deref().unwrap_or("."))
    }

    /// Resolved source test directory.
    pub fn source_path(&self) -> PathBuf {
        self.root()
            .join(self.source_dir.as_deref().unwrap_or(DEFAULT_SOURCE_DIR))
    }

    /// Resolved flat test directory.
    pub fn flat_path(&self) -> PathBuf {
        self.root()
            .join(self.flat_dir.as_deref().unwrap_or(DEFAULT_FLAT_DIR))
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default source test directory, relative to the data root.
pub const DEFAULT_SOURCE_DIR: &str = "tests";

/// Default flat test directory, relative to the data root.
pub const DEFAULT_FLAT_DIR: &str = "generated-tests";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`ToolConfig`] from an optional TOML file path.
///
/// Without a path the defaults are used. `CTL_*` variables are layered on
/// top either way.
pub fn load_config(path: Option<&Path>) -> Result<ToolConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            debug!(target: "ctl.config", path = %p.display(), "loading config");
            parse_toml(&read(p)?)?
        }
        None => ToolConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`ToolConfig`].
pub fn parse_toml(content: &str) -> Result<ToolConfig, ConfigError> {
    toml::from_str::<ToolConfig>(content).map_err(|e| ConfigError::ParseError {
        path: "<inline>".into(),
        reason: e.to_string(),
    })
}

/// Load a stand-alone capability declaration.
///
/// Files ending in `.json` are read as JSON; anything else as TOML.
pub fn load_declaration(path: &Path) -> Result<CapabilityDeclaration, ConfigError> {
    let content = read(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| ConfigError::ParseError {
        path: path.display().to_string(),
        reason,
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.display().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Overwrite fields from the process environment:
/// - `CTL_TEST_DATA_DIR`
/// - `CTL_SOURCE_DIR`
/// - `CTL_FLAT_DIR`
/// - `CTL_LOG_LEVEL`
pub fn apply_env_overrides(config: &mut ToolConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// [`apply_env_overrides`] with an explicit variable lookup.
pub fn apply_overrides_from(config: &mut ToolConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("CTL_TEST_DATA_DIR") {
        config.test_data_dir = Some(val);
    }
    if let Some(val) = lookup("CTL_SOURCE_DIR") {
        config.source_dir = Some(val);
    }
    if let Some(val) = lookup("CTL_FLAT_DIR") {
        config.flat_dir = Some(val);
    }
    if let Some(val) = lookup("CTL_LOG_LEVEL") {
        config.log_level = Some(val);
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a parsed configuration and collect warnings.
///
/// Hard errors (bad log level, empty directory names, a declaration with
/// conflicting behaviours) are returned as a
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &ToolConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(level) = &config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }
    for (field, value) in [
        ("source_dir", &config.source_dir),
        ("flat_dir", &config.flat_dir),
    ] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            errors.push(format!("{field} must not be empty"));
        }
    }

    match &config.implementation {
        Some(decl) => {
            if let Err(e) = decl.validate() {
                errors.push(e.to_string());
            }
            warnings.extend(declaration_warnings(decl));
        }
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "implementation".into(),
            hint: "no flat test will be compatible".into(),
        }),
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

/// Advisory checks on a capability declaration.
pub fn declaration_warnings(decl: &CapabilityDeclaration) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    if decl.supported_functions.is_empty() {
        warnings.push(ConfigWarning::NoSupportedFunctions);
    }

    let unknown = |kind: &'static str, name: &str| ConfigWarning::UnknownIdentifier {
        kind,
        name: name.to_string(),
    };
    for f in decl
        .supported_functions
        .iter()
        .chain(&decl.unsupported_functions)
    {
        if f.known().is_none() {
            warnings.push(unknown("function", f.as_str()));
        }
    }
    for f in decl
        .supported_features
        .iter()
        .chain(&decl.unsupported_features)
    {
        if f.known().is_none() {
            warnings.push(unknown("feature", f.as_str()));
        }
    }
    for b in &decl.behavior_choices {
        if b.known().is_none() {
            warnings.push(unknown("behavior", b.as_str()));
        }
    }
    if decl.variant_choice.known().is_none() {
        warnings.push(unknown("variant", decl.variant_choice.as_str()));
    }

    for f in decl.supported_features.intersection(&decl.unsupported_features) {
        warnings.push(ConfigWarning::ContradictoryFeature {
            feature: f.to_string(),
        });
    }
    warnings
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Values in `overlay` take precedence over `base`.
///
/// The implementation declaration is replaced whole, never merged set by set.
pub fn merge_configs(base: ToolConfig, overlay: ToolConfig) -> ToolConfig {
    ToolConfig {
        test_data_dir: overlay.test_data_dir.or(base.test_data_dir),
        source_dir: overlay.source_dir.or(base.source_dir),
        flat_dir: overlay.flat_dir.or(base.flat_dir),
        log_level: overlay.log_level.or(base.log_level),
        implementation: overlay.implementation.or(base.implementation),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
