// SPDX-License-Identifier: Apache-2.0

//! Validation of mutation inputs against entity field metadata.
//!
//! Both entry points are pure: they return a [`Patch`] or the full list of violations and never
//! touch storage. Callers write the patch only after a successful validation, so a rejected input
//! has no effect on stored state.

use std::fmt::{Display, Formatter};

use graft_core::{ErrorCode, TypeName};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::input::{CreateInput, UpdateInput, UpdateValue};
use crate::patch::{Patch, PatchOp};
use crate::schema::{EntitySchema, FieldSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ViolationKind {
    FieldNotUpdatable,
    NullNotAllowed,
    MissingRequiredField,
    InvalidValue,
    UnknownField,
}

impl ViolationKind {
    #[must_use]
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::FieldNotUpdatable => ErrorCode::FieldNotUpdatable,
            Self::NullNotAllowed => ErrorCode::NullNotAllowed,
            Self::MissingRequiredField => ErrorCode::MissingRequiredField,
            Self::InvalidValue => ErrorCode::InvalidValue,
            Self::UnknownField => ErrorCode::UnknownField,
        }
    }

    /// Lower ranks win when several kinds are reported for one input.
    const fn rank(self) -> u8 {
        match self {
            Self::NullNotAllowed => 0,
            Self::MissingRequiredField => 1,
            Self::FieldNotUpdatable => 2,
            Self::UnknownField => 3,
            Self::InvalidValue => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &str, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind,
            message: message.into(),
        }
    }
}

/// Every violation found in one input, in field-name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeError {
    pub type_name: TypeName,
    pub violations: Vec<FieldViolation>,
}

impl MergeError {
    /// Code of the highest-ranked violation, independent of field order. The API boundary
    /// reports this as the error code and lists every violation as a field error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.violations
            .iter()
            .map(|v| v.kind)
            .min_by_key(|kind| kind.rank())
            .map_or(ErrorCode::InvalidValue, ViolationKind::code)
    }

    #[must_use]
    pub fn has(&self, field: &str, kind: ViolationKind) -> bool {
        self.violations
            .iter()
            .any(|v| v.field == field && v.kind == kind)
    }
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} input rejected:", self.type_name)?;
        for v in &self.violations {
            write!(f, " [{:?} {}: {}]", v.kind, v.field, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for MergeError {}

/// Validates a sparse update and returns the patch of exactly the fields present in the input.
///
/// A field set to the value it already holds is still part of the patch.
pub fn merge_update(schema: &EntitySchema, input: &UpdateInput) -> Result<Patch, MergeError> {
    let mut patch = Patch::new(schema.type_name().clone());
    let mut violations = Vec::new();

    for (field, value) in input.present() {
        let Some(spec) = schema.field(field) else {
            violations.push(FieldViolation::new(
                field,
                ViolationKind::FieldNotUpdatable,
                "field is not declared on this type",
            ));
            continue;
        };
        if !spec.updatable {
            violations.push(FieldViolation::new(
                field,
                ViolationKind::FieldNotUpdatable,
                "field is read-only",
            ));
            continue;
        }
        match value {
            UpdateValue::Absent => {}
            UpdateValue::Null => match check_null(spec) {
                Ok(()) => patch.push(field, PatchOp::Clear),
                Err(v) => violations.push(v),
            },
            UpdateValue::Value(v) => match check_kind(spec, v) {
                Ok(()) => patch.push(field, PatchOp::Set(v.clone())),
                Err(v) => violations.push(v),
            },
        }
    }

    finish(schema, patch, violations)
}

/// Validates a create input: required fields must carry a concrete value, every supplied field
/// must be declared and of the declared kind. Read-only fields may be set here.
pub fn validate_create(schema: &EntitySchema, input: &CreateInput) -> Result<Patch, MergeError> {
    let mut patch = Patch::new(schema.type_name().clone());
    let mut violations = Vec::new();

    for (field, value) in input.iter() {
        let Some(spec) = schema.field(field) else {
            violations.push(FieldViolation::new(
                field,
                ViolationKind::UnknownField,
                "field is not declared on this type",
            ));
            continue;
        };
        let checked = if value.is_null() {
            check_null(spec).map(|()| PatchOp::Clear)
        } else {
            check_kind(spec, value).map(|()| PatchOp::Set(value.clone()))
        };
        match checked {
            Ok(op) => patch.push(field, op),
            Err(v) => violations.push(v),
        }
    }

    for spec in schema.required_fields() {
        if input.get(spec.name.as_str()).is_none() {
            violations.push(FieldViolation::new(
                spec.name.as_str(),
                ViolationKind::MissingRequiredField,
                "required field is missing",
            ));
        }
    }

    finish(schema, patch, violations)
}

fn check_null(spec: &FieldSpec) -> Result<(), FieldViolation> {
    if spec.nullable {
        Ok(())
    } else {
        Err(FieldViolation::new(
            spec.name.as_str(),
            ViolationKind::NullNotAllowed,
            "field is non-nullable",
        ))
    }
}

fn check_kind(spec: &FieldSpec, value: &Value) -> Result<(), FieldViolation> {
    if spec.kind.accepts(value) {
        Ok(())
    } else {
        Err(FieldViolation::new(
            spec.name.as_str(),
            ViolationKind::InvalidValue,
            format!("expected a value of kind {}", spec.kind.as_str()),
        ))
    }
}

fn finish(
    schema: &EntitySchema,
    patch: Patch,
    mut violations: Vec<FieldViolation>,
) -> Result<Patch, MergeError> {
    if violations.is_empty() {
        return Ok(patch);
    }
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    Err(MergeError {
        type_name: schema.type_name().clone(),
        violations,
    })
}
