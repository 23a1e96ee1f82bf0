// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stable error codes and a unified error type for the CCL test library.
//!
//! Every library crate in the workspace defines its own `thiserror` enum and
//! maps each variant onto an [`ErrorCode`] through [`CodedError`]. Binaries
//! that need a single error shape (for JSON output, say) convert into
//! [`CtlError`], which carries the code, a message, an optional cause, and
//! arbitrary key-value context.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Which stage of the pipeline an [`ErrorCode`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Invalid capability declarations or tool configuration. Always fatal.
    Config,
    /// Malformed test file content.
    Parse,
    /// Local file-system failures.
    Io,
    /// Source-to-flat generation failures.
    Transform,
    /// Bugs and anything without a better home.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Parse => "parse",
            Self::Io => "io",
            Self::Transform => "transform",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Stable identifier for a failure.
///
/// Serialised as the `SCREAMING_SNAKE_CASE` string from [`ErrorCode::as_str`].
/// Scripts match on these strings, so renaming one is a breaking change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Config --
    /// Two behaviours from the same mutually-exclusive group were declared.
    ConfigConflictingBehaviors,
    /// A configuration value is invalid.
    ConfigInvalid,
    /// A configuration file could not be found or read.
    ConfigNotFound,

    // -- Parse --
    /// File content is not valid JSON (or TOML for configs).
    ParseInvalidSyntax,
    /// JSON is well-formed but a test record is not.
    ParseInvalidRecord,
    /// The file shape does not match the requested format.
    ParseUnexpectedShape,

    // -- Io --
    /// Reading a file or directory failed.
    IoReadFailed,
    /// Writing a file or directory failed.
    IoWriteFailed,

    // -- Transform --
    /// A generated flat file failed post-generation validation.
    TransformInvalidOutput,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// The pipeline stage this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigConflictingBehaviors | Self::ConfigInvalid | Self::ConfigNotFound => {
                ErrorCategory::Config
            }

            Self::ParseInvalidSyntax | Self::ParseInvalidRecord | Self::ParseUnexpectedShape => {
                ErrorCategory::Parse
            }

            Self::IoReadFailed | Self::IoWriteFailed => ErrorCategory::Io,

            Self::TransformInvalidOutput => ErrorCategory::Transform,

            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// The wire string, e.g. `"CONFIG_CONFLICTING_BEHAVIORS"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigConflictingBehaviors => "CONFIG_CONFLICTING_BEHAVIORS",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::ParseInvalidSyntax => "PARSE_INVALID_SYNTAX",
            Self::ParseInvalidRecord => "PARSE_INVALID_RECORD",
            Self::ParseUnexpectedShape => "PARSE_UNEXPECTED_SHAPE",
            Self::IoReadFailed => "IO_READ_FAILED",
            Self::IoWriteFailed => "IO_WRITE_FAILED",
            Self::TransformInvalidOutput => "TRANSFORM_INVALID_OUTPUT",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether errors of this code abort a directory-wide load even under a
    /// lenient error policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self.category(), ErrorCategory::Config | ErrorCategory::Internal)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CodedError
// ---------------------------------------------------------------------------

/// Implemented by every crate-local error enum in the workspace.
pub trait CodedError: std::error::Error + Send + Sync + 'static {
    /// The stable code for this error value.
    fn code(&self) -> ErrorCode;

    /// Wrap `self` as the cause of a [`CtlError`] carrying the same message.
    fn into_ctl_error(self) -> CtlError
    where
        Self: Sized,
    {
        CtlError::new(self.code(), self.to_string()).with_source(self)
    }
}

// ---------------------------------------------------------------------------
// CtlError
// ---------------------------------------------------------------------------

/// A failure flattened to one shape for the CLI and other reporting
/// surfaces.
///
/// ```
/// use ctl_error::{CtlError, ErrorCode};
///
/// let err = CtlError::new(ErrorCode::ParseInvalidSyntax, "unexpected end of input")
///     .with_context("path", "tests/api_basic.json")
///     .with_context("line", 12);
/// assert!(err.to_string().starts_with("[PARSE_INVALID_SYNTAX]"));
/// ```
#[derive(Debug, thiserror::Error)]
#[error("[{code}] {message}{}", context_suffix(.context))]
pub struct CtlError {
    /// Stable code.
    pub code: ErrorCode,
    /// What went wrong, including any wrapped context chain.
    pub message: String,
    /// The originating crate error, when kept.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Diagnostic key-value pairs, rendered sorted by key.
    pub context: BTreeMap<String, serde_json::Value>,
}

fn context_suffix(context: &BTreeMap<String, serde_json::Value>) -> String {
    if context.is_empty() {
        return String::new();
    }
    serde_json::to_string(context)
        .map(|rendered| format!(" {rendered}"))
        .unwrap_or_default()
}

impl CtlError {
    /// An error with no cause and no context.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Record `key = value`. Unserialisable values are dropped.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.context.insert(key.into(), value);
        }
        self
    }

    /// Keep `source` as the cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// The category of [`CtlError::code`].
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

/// [`CtlError`] as JSON: the cause is reduced to its message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtlErrorDto {
    /// Stable code.
    pub code: ErrorCode,
    /// Category of `code`, spelled out for consumers that only switch on it.
    pub category: ErrorCategory,
    /// Message text.
    pub message: String,
    /// Diagnostic pairs; omitted when empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,
    /// The cause's message; omitted when there is none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&CtlError> for CtlErrorDto {
    fn from(err: &CtlError) -> Self {
        let CtlError {
            code,
            message,
            source,
            context,
        } = err;
        Self {
            code: *code,
            category: code.category(),
            message: message.clone(),
            context: context.clone(),
            source_message: source.as_deref().map(ToString::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
