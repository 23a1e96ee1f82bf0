// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loader errors.

use ctl_capability::CapabilityError;
use ctl_error::{CodedError, ErrorCode};
use std::path::PathBuf;

/// A file or directory that could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON, or a record in it is malformed.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON, but not a shape the requested format allows.
    #[error("unexpected content in {}: expected {expected}, found {found}", path.display())]
    UnexpectedShape {
        /// Offending file.
        path: PathBuf,
        /// What the format requires.
        expected: &'static str,
        /// What the file holds.
        found: &'static str,
    },

    /// The directory could not be listed.
    #[error("failed to list test files in {}: {reason}", dir.display())]
    Discover {
        /// Directory being listed.
        dir: PathBuf,
        /// Rendered cause chain.
        reason: String,
    },

    /// The declaration the loader was built with is invalid.
    #[error(transparent)]
    Declaration(#[from] CapabilityError),
}

impl LoadError {
    /// The file or directory the error concerns, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::UnexpectedShape { path, .. } => {
                Some(path)
            }
            Self::Discover { dir, .. } => Some(dir),
            Self::Declaration(_) => None,
        }
    }
}

impl CodedError for LoadError {
    fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Discover { .. } => ErrorCode::IoReadFailed,
            Self::Parse { .. } => ErrorCode::ParseInvalidSyntax,
            Self::UnexpectedShape { .. } => ErrorCode::ParseUnexpectedShape,
            Self::Declaration(e) => e.code(),
        }
    }
}
