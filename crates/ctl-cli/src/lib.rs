// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
#![warn(missing_docs)]
//! ctl-cli
//!
//! Library half of the `ctl` binary: command implementations and output
//! formatting, testable without spawning a process.

pub mod commands;
pub mod format;
