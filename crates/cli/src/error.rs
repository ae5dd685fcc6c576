// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::io;

/// Why a dispatch sequence was abandoned part way.
#[derive(Debug)]
pub enum DispatchError {
    /// Writing step `step` (0-based) of the sequence failed.
    Write { step: usize, source: io::Error },
    /// The child's input was closed before the sequence started.
    InputClosed,
}

impl DispatchError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Write { .. } => "WRITE_FAILED",
            Self::InputClosed => "INPUT_CLOSED",
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write { step, source } => write!(f, "write step {step} failed: {source}"),
            Self::InputClosed => f.write_str("child input closed"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write { source, .. } => Some(source),
            Self::InputClosed => None,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
