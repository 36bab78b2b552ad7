// SPDX-License-Identifier: Apache-2.0

use graft_core::{ErrorCode, FieldName, TypeName};
use graft_model::{
    merge_update, validate_create, CreateInput, EntitySchema, FieldKind, FieldSpec, PatchOp,
    UpdateInput,
};
use serde_json::{json, Map, Value};

fn post_schema() -> EntitySchema {
    let f = |raw: &str| FieldName::new(raw).expect("field");
    EntitySchema::new(
        TypeName::new("Post").expect("type"),
        vec![
            FieldSpec::required(f("title"), FieldKind::String),
            FieldSpec::optional(f("summary"), FieldKind::String),
            FieldSpec::required(f("published"), FieldKind::Bool),
        ],
    )
    .expect("schema")
}

#[test]
fn patch_contains_exactly_the_explicit_fields_even_when_unchanged() {
    let mut record = Map::new();
    record.insert("title".to_string(), json!("Hello"));
    record.insert("summary".to_string(), json!("old"));
    record.insert("published".to_string(), json!(false));

    let input: UpdateInput = serde_json::from_value(json!({"title": "Hello"})).expect("input");
    let patch = merge_update(&post_schema(), &input).expect("valid update");
    assert_eq!(patch.len(), 1);
    assert_eq!(patch.get("title"), Some(&PatchOp::Set(json!("Hello"))));

    let before = record.clone();
    patch.apply_to(&mut record);
    assert_eq!(record, before, "setting the same value leaves the record unchanged");
}

#[test]
fn rejected_update_produces_no_patch_to_apply() {
    let input: UpdateInput =
        serde_json::from_value(json!({"title": null, "summary": "new"})).expect("input");
    let err = merge_update(&post_schema(), &input).expect_err("title is non-nullable");
    assert_eq!(err.code(), ErrorCode::NullNotAllowed);
    assert_eq!(err.violations.len(), 1);
    assert!(err.to_string().contains("title"));
}

#[test]
fn top_level_code_does_not_depend_on_field_order() {
    let schema = EntitySchema::new(
        TypeName::new("Post").expect("type"),
        vec![
            FieldSpec::optional(FieldName::new("alpha").expect("f"), FieldKind::Int),
            FieldSpec::required(FieldName::new("zeta").expect("f"), FieldKind::String),
        ],
    )
    .expect("schema");
    let input: UpdateInput =
        serde_json::from_value(json!({"alpha": "not a number", "zeta": null, "aaa": 1}))
            .expect("input");
    let err = merge_update(&schema, &input).expect_err("three violations");
    assert_eq!(err.violations.len(), 3);
    assert_eq!(err.code(), ErrorCode::NullNotAllowed);

    let input: UpdateInput =
        serde_json::from_value(json!({"alpha": "not a number", "aaa": 1})).expect("input");
    let err = merge_update(&schema, &input).expect_err("two violations");
    assert_eq!(err.code(), ErrorCode::FieldNotUpdatable);
}

#[test]
fn integers_outside_the_signed_range_are_invalid_values() {
    let schema = EntitySchema::new(
        TypeName::new("User").expect("type"),
        vec![FieldSpec::optional(FieldName::new("age").expect("f"), FieldKind::Int)],
    )
    .expect("schema");
    let create = CreateInput::new().with("age", json!(u64::MAX));
    let err = validate_create(&schema, &create).expect_err("u64::MAX does not fit");
    assert_eq!(err.code(), ErrorCode::InvalidValue);

    let update = UpdateInput::new().set("age", json!(u64::MAX));
    let err = merge_update(&schema, &update).expect_err("u64::MAX does not fit");
    assert_eq!(err.code(), ErrorCode::InvalidValue);

    let ok = UpdateInput::new().set("age", json!(i64::MAX));
    assert!(merge_update(&schema, &ok).is_ok());
}

#[test]
fn cleared_field_is_stored_as_null() {
    let input = UpdateInput::new().clear("summary");
    let patch = merge_update(&post_schema(), &input).expect("clear summary");
    let mut record = Map::new();
    record.insert("summary".to_string(), json!("text"));
    patch.apply_to(&mut record);
    assert_eq!(record.get("summary"), Some(&Value::Null));
}

#[test]
fn create_and_update_paths_report_different_codes_for_absence_and_null() {
    let absent = CreateInput::new().with("published", json!(true));
    assert_eq!(
        validate_create(&post_schema(), &absent)
            .expect_err("title absent")
            .code(),
        ErrorCode::MissingRequiredField
    );

    let null = CreateInput::new()
        .with("title", Value::Null)
        .with("published", json!(true));
    assert_eq!(
        validate_create(&post_schema(), &null)
            .expect_err("title null")
            .code(),
        ErrorCode::NullNotAllowed
    );
}

#[test]
fn patch_serializes_with_explicit_operations() {
    let input = UpdateInput::new()
        .set("title", json!("T"))
        .clear("summary");
    let patch = merge_update(&post_schema(), &input).expect("patch");
    let wire = serde_json::to_value(&patch).expect("serialize");
    assert_eq!(
        wire,
        json!({
            "type_name": "Post",
            "ops": {
                "summary": {"op": "clear"},
                "title": {"op": "set", "value": "T"}
            }
        })
    );
}
