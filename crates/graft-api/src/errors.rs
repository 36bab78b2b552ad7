// SPDX-License-Identifier: Apache-2.0

use graft_core::ErrorCode;
use graft_model::{MergeError, ValidationError};
use graft_query::{ConnectionError, CursorError, IdError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Structured error returned at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::InvalidArguments,
            format!("invalid argument: {name}"),
            json!({"field_errors":[{"parameter": name, "reason": "invalid", "value": value}]}),
        )
    }

    #[must_use]
    pub fn missing_param(name: &str) -> Self {
        Self::new(
            ErrorCode::InvalidArguments,
            format!("missing argument: {name}"),
            json!({"field_errors":[{"parameter": name, "reason": "missing"}]}),
        )
    }

    /// `code` is the code of the first field error.
    #[must_use]
    pub fn validation_failed(code: ErrorCode, field_errors: Value) -> Self {
        Self::new(
            code,
            "validation failed",
            json!({"field_errors": field_errors}),
        )
    }

    #[must_use]
    pub fn not_found(what: &str) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("not found: {what}"),
            json!({"resource": what}),
        )
    }

    #[must_use]
    pub fn unauthorized(action: &str, resource: &str) -> Self {
        Self::new(
            ErrorCode::Unauthorized,
            format!("not allowed to {action} {resource}"),
            json!({"action": action, "resource": resource}),
        )
    }

    #[must_use]
    pub fn unknown_field(coordinate: &str) -> Self {
        Self::new(
            ErrorCode::UnknownField,
            format!("unknown field: {coordinate}"),
            json!({"field": coordinate}),
        )
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message, json!({}))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<IdError> for ApiError {
    fn from(value: IdError) -> Self {
        Self::new(
            value.error_code(),
            value.message,
            json!({"reason": value.code.as_str()}),
        )
    }
}

impl From<CursorError> for ApiError {
    fn from(value: CursorError) -> Self {
        Self::new(
            value.error_code(),
            format!("invalid cursor: {}", value.message),
            json!({"reason": value.code.as_str()}),
        )
    }
}

impl From<ConnectionError> for ApiError {
    fn from(value: ConnectionError) -> Self {
        match value {
            ConnectionError::Cursor(e) => e.into(),
            ConnectionError::PageSizeExceeded { requested, max } => Self::new(
                ErrorCode::PageSizeExceeded,
                format!("requested page size {requested} exceeds maximum {max}"),
                json!({"requested": requested, "max": max}),
            ),
            ConnectionError::InvalidArguments(msg) => {
                Self::new(ErrorCode::InvalidArguments, msg, json!({}))
            }
            ConnectionError::Source(e) => Self::internal(format!("source failure: {e}")),
        }
    }
}

impl From<MergeError> for ApiError {
    fn from(value: MergeError) -> Self {
        let field_errors: Vec<Value> = value
            .violations
            .iter()
            .map(|v| json!({"field": v.field, "code": v.kind.code(), "message": v.message}))
            .collect();
        let mut err = Self::validation_failed(value.code(), Value::Array(field_errors));
        err.message = format!("{} input rejected", value.type_name);
        err
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::new(ErrorCode::InvalidArguments, value.0, json!({}))
    }
}
