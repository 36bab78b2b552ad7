// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error codes shared by every layer of the workspace.
///
/// The string form (`as_str`) is the stable wire contract; variant order is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCode {
    InvalidIdentifier,
    InvalidCursor,
    InvalidArguments,
    PageSizeExceeded,
    FieldNotUpdatable,
    NullNotAllowed,
    MissingRequiredField,
    InvalidValue,
    MissingResolver,
    OrphanResolver,
    DuplicateResolver,
    UnknownField,
    Unauthorized,
    NotFound,
    Internal,
}

pub const ERROR_CODES: &[ErrorCode] = &[
    ErrorCode::InvalidIdentifier,
    ErrorCode::InvalidCursor,
    ErrorCode::InvalidArguments,
    ErrorCode::PageSizeExceeded,
    ErrorCode::FieldNotUpdatable,
    ErrorCode::NullNotAllowed,
    ErrorCode::MissingRequiredField,
    ErrorCode::InvalidValue,
    ErrorCode::MissingResolver,
    ErrorCode::OrphanResolver,
    ErrorCode::DuplicateResolver,
    ErrorCode::UnknownField,
    ErrorCode::Unauthorized,
    ErrorCode::NotFound,
    ErrorCode::Internal,
];

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidIdentifier => "InvalidIdentifier",
            Self::InvalidCursor => "InvalidCursor",
            Self::InvalidArguments => "InvalidArguments",
            Self::PageSizeExceeded => "PageSizeExceeded",
            Self::FieldNotUpdatable => "FieldNotUpdatable",
            Self::NullNotAllowed => "NullNotAllowed",
            Self::MissingRequiredField => "MissingRequiredField",
            Self::InvalidValue => "InvalidValue",
            Self::MissingResolver => "MissingResolver",
            Self::OrphanResolver => "OrphanResolver",
            Self::DuplicateResolver => "DuplicateResolver",
            Self::UnknownField => "UnknownField",
            Self::Unauthorized => "Unauthorized",
            Self::NotFound => "NotFound",
            Self::Internal => "Internal",
        }
    }

    /// Registry inconsistencies abort startup; everything else is a per-request error.
    #[must_use]
    pub const fn is_startup_fatal(self) -> bool {
        matches!(
            self,
            Self::MissingResolver | Self::OrphanResolver | Self::DuplicateResolver
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    Validation = 3,
    DependencyFailure = 4,
    Internal = 10,
}

impl ExitCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Usage => "usage",
            Self::Validation => "validation",
            Self::DependencyFailure => "dependency_failure",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    SerdeJson(serde_json::Error),
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Error {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SerdeJson(_) => ErrorCode::Internal,
            Self::InvalidIdentifier { .. } => ErrorCode::InvalidIdentifier,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerdeJson(err) => write!(f, "serde json error: {err}"),
            Self::InvalidIdentifier {
                kind,
                value,
                reason,
            } => write!(f, "invalid {kind} `{value}`: {reason}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SerdeJson(err) => Some(err),
            Self::InvalidIdentifier { .. } => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::SerdeJson(value)
    }
}

/// Flat error report for CLI and log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

impl MachineError {
    #[must_use]
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.to_string(),
            details: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: &str) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

impl fmt::Display for MachineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for MachineError {}
