//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Ji.
//! The Ji project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Ji Error Module
//!
//! This module defines the error types used throughout Ji for consistent
//! error handling and reporting.
//!
//! ## Error Categories
//!
//! - **CompileFailed**: The compiler rejected a source unit (diagnostics attached)
//! - **ResolutionFailed**: No execution path root produced the requested unit
//! - **MemberNotFound**: A field or method name is unknown to a loaded unit
//! - **TypeMismatch**: A static slot was accessed as the wrong kind
//! - **MalformedPath**: A location could not be canonicalized
//! - **ClassFormat**: A binary unit could not be decoded
//! - **Io** / **Zip** / **Serde**: Wrapped infrastructure failures
//!
//! Per-root failures inside a resolution are not errors on their own; only
//! the exhaustion of every root is reported as `ResolutionFailed`.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::result::ZipError;

use crate::compiler::JiCDiagnostic;
use crate::namespace::JiCRootAttempt;

/// Convenience result type used throughout Ji.
pub type Result<T> = std::result::Result<T, JiError>;

/// Canonical error enumeration for Ji.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum JiError {
    /// Errors originating from filesystem or process IO.
    #[error("io error: {0}")]
    Io(String),

    /// The compiler rejected a source unit. Diagnostics are kept for the caller.
    #[error("compilation of '{unit}' failed with {} diagnostic(s)", diagnostics.len())]
    CompileFailed {
        unit: String,
        diagnostics: Vec<JiCDiagnostic>,
    },

    /// Every execution path root was tried and none yielded the unit.
    #[error("unit '{name}' could not be resolved after {} attempt(s)", attempts.len())]
    ResolutionFailed {
        name: String,
        attempts: Vec<JiCRootAttempt>,
    },

    /// Lookup of a named member on a loaded unit failed.
    #[error("member '{member}' not found on '{unit}'")]
    MemberNotFound { unit: String, member: String },

    /// A member exists but was accessed as an incompatible kind.
    #[error("member '{member}' has type {actual}, requested {expected}")]
    TypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    /// Writes to a final static slot.
    #[error("member '{member}' is final")]
    ReadOnly { member: String },

    /// A location that could not be canonicalized.
    #[error("malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// A binary unit that does not decode as a class file.
    #[error("class format error: {0}")]
    ClassFormat(String),

    /// A handle presented to a session that does not own it.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// The compiler process exceeded its deadline and was killed. Diagnostics
    /// printed before the kill are kept.
    #[error("'{command}' timed out after {seconds}s")]
    Timeout {
        command: String,
        seconds: u64,
        #[serde(default)]
        diagnostics: Vec<JiCDiagnostic>,
    },

    /// Missing or invalid loader configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Errors originating from ZIP file operations.
    #[error("zip error: {0}")]
    Zip(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for JiError {
    fn from(err: io::Error) -> Self {
        JiError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for JiError {
    fn from(err: serde_json::Error) -> Self {
        JiError::Serde(err.to_string())
    }
}

impl From<ZipError> for JiError {
    fn from(err: ZipError) -> Self {
        JiError::Zip(err.to_string())
    }
}

impl JiError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        JiError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct malformed path errors.
    pub fn malformed_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        JiError::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Helper to construct member lookup errors.
    pub fn member_not_found(unit: impl Into<String>, member: impl Into<String>) -> Self {
        JiError::MemberNotFound {
            unit: unit.into(),
            member: member.into(),
        }
    }

    /// Helper to construct class format errors.
    pub fn class_format<T: Into<String>>(message: T) -> Self {
        JiError::ClassFormat(message.into())
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        JiError::Internal(message.into())
    }
}
