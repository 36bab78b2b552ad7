// SPDX-License-Identifier: Apache-2.0

//! Typed arguments parsed from the JSON argument object of a field call.

use graft_core::{ErrorCode, FieldName, TypeName};
use graft_model::{
    CreateInput, EntitySchema, FieldKind, GlobalId, SortDirection, SortOrder, UpdateInput,
};
use graft_query::{IdCodec, PageArgs, MAX_CURSOR_TOKEN_LEN};
use serde_json::{json, Map, Value};

use crate::ApiError;

pub const MAX_CURSOR_BYTES: usize = MAX_CURSOR_TOKEN_LEN;
pub const PAGE_ARGS: [&str; 4] = ["first", "after", "last", "before"];
pub const SORT_ARGS: [&str; 2] = ["sortBy", "direction"];

/// Parses `first`/`after`/`last`/`before`. A JSON `null` is treated as not supplied.
pub fn parse_page_args(args: &Map<String, Value>) -> Result<PageArgs, ApiError> {
    Ok(PageArgs {
        first: int_arg(args, "first")?,
        after: cursor_arg(args, "after")?,
        last: int_arg(args, "last")?,
        before: cursor_arg(args, "before")?,
    })
}

/// Parses `sortBy` and `direction` against `schema`. Without `sortBy` the list is ordered by
/// local id.
pub fn parse_sort_order(
    args: &Map<String, Value>,
    schema: &EntitySchema,
) -> Result<SortOrder, ApiError> {
    let direction = match args.get("direction") {
        None | Some(Value::Null) => SortDirection::Asc,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("asc") => SortDirection::Asc,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("desc") => SortDirection::Desc,
        Some(other) => return Err(ApiError::invalid_param("direction", &other.to_string())),
    };
    let Some(raw) = string_arg(args, "sortBy")? else {
        let mut order = SortOrder::by_id(schema.type_name().clone());
        order.direction = direction;
        return Ok(order);
    };
    let spec = schema
        .field(&raw)
        .ok_or_else(|| ApiError::invalid_param("sortBy", &raw))?;
    if matches!(spec.kind, FieldKind::Float | FieldKind::Json) {
        return Err(ApiError::new(
            ErrorCode::InvalidArguments,
            format!("field `{raw}` of kind {} is not sortable", spec.kind.as_str()),
            json!({"field_errors":[{"parameter": "sortBy", "reason": "not_sortable", "value": raw}]}),
        ));
    }
    let field = FieldName::new(raw.as_str()).map_err(|_| ApiError::invalid_param("sortBy", &raw))?;
    Ok(SortOrder::by_field(
        schema.type_name().clone(),
        field,
        direction,
    ))
}

pub fn parse_global_id_arg(
    args: &Map<String, Value>,
    name: &str,
    ids: &IdCodec,
) -> Result<GlobalId, ApiError> {
    let raw = string_arg(args, name)?.ok_or_else(|| ApiError::missing_param(name))?;
    ids.decode(&raw).map_err(ApiError::from)
}

/// Like [`parse_global_id_arg`] but the id must belong to `expected`.
pub fn parse_typed_global_id_arg(
    args: &Map<String, Value>,
    name: &str,
    ids: &IdCodec,
    expected: &TypeName,
) -> Result<GlobalId, ApiError> {
    let raw = string_arg(args, name)?.ok_or_else(|| ApiError::missing_param(name))?;
    ids.decode_as(&raw, expected).map_err(ApiError::from)
}

pub fn parse_update_input(args: &Map<String, Value>, name: &str) -> Result<UpdateInput, ApiError> {
    Ok(UpdateInput::from_json_object(object_arg(args, name)?))
}

pub fn parse_create_input(args: &Map<String, Value>, name: &str) -> Result<CreateInput, ApiError> {
    Ok(CreateInput::from_json_object(object_arg(args, name)?.clone()))
}

/// Rejects argument names outside `allowed`.
pub fn reject_unknown_args(args: &Map<String, Value>, allowed: &[&str]) -> Result<(), ApiError> {
    let unknown: Vec<&str> = args
        .keys()
        .map(String::as_str)
        .filter(|k| !allowed.contains(k))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    let field_errors: Vec<Value> = unknown
        .iter()
        .map(|k| json!({"parameter": k, "reason": "unknown"}))
        .collect();
    Err(ApiError::new(
        ErrorCode::InvalidArguments,
        format!("unknown arguments: {}", unknown.join(", ")),
        json!({"field_errors": field_errors}),
    ))
}

/// Integers above `i64::MAX` saturate, so oversized page sizes still fail the ceiling check.
fn int_arg(args: &Map<String, Value>, name: &str) -> Result<Option<i64>, ApiError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_u64().map(|_| i64::MAX))
            .map(Some)
            .ok_or_else(|| ApiError::invalid_param(name, &v.to_string())),
    }
}

fn string_arg(args: &Map<String, Value>, name: &str) -> Result<Option<String>, ApiError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v) => Err(ApiError::invalid_param(name, &v.to_string())),
    }
}

fn cursor_arg(args: &Map<String, Value>, name: &str) -> Result<Option<String>, ApiError> {
    let cursor = string_arg(args, name)?;
    if let Some(c) = &cursor {
        if c.len() > MAX_CURSOR_BYTES {
            return Err(ApiError::new(
                ErrorCode::InvalidCursor,
                "invalid cursor: exceeds max length",
                json!({"parameter": name, "max_bytes": MAX_CURSOR_BYTES}),
            ));
        }
    }
    Ok(cursor)
}

fn object_arg<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a Map<String, Value>, ApiError> {
    match args.get(name) {
        Some(Value::Object(o)) => Ok(o),
        None | Some(Value::Null) => Err(ApiError::missing_param(name)),
        Some(v) => Err(ApiError::invalid_param(name, &v.to_string())),
    }
}
