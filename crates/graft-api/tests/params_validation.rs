use graft_api::params::{
    parse_create_input, parse_global_id_arg, parse_update_input, reject_unknown_args,
    MAX_CURSOR_BYTES, PAGE_ARGS,
};
use graft_api::{parse_page_args, parse_sort_order, ApiError};
use graft_core::{ErrorCode, FieldName, TypeName};
use graft_model::{EntitySchema, FieldKind, FieldSpec, SortDirection, UpdateValue};
use graft_query::{IdCodec, PageLimits};
use serde_json::{json, Map, Value};

fn args(v: Value) -> Map<String, Value> {
    v.as_object().cloned().expect("object")
}

fn schema() -> EntitySchema {
    EntitySchema::new(
        TypeName::new("User").expect("type"),
        vec![
            FieldSpec::required(FieldName::new("name").expect("f"), FieldKind::String),
            FieldSpec::optional(FieldName::new("score").expect("f"), FieldKind::Float),
        ],
    )
    .expect("schema")
}

#[test]
fn page_args_accept_integers_and_null() {
    let parsed = parse_page_args(&args(json!({"first": 5, "after": "c", "last": null})))
        .expect("page args");
    assert_eq!(parsed.first, Some(5));
    assert_eq!(parsed.after.as_deref(), Some("c"));
    assert_eq!(parsed.last, None);
}

#[test]
fn page_args_reject_non_integer_sizes() {
    for bad in [json!("5"), json!(2.5), json!(true)] {
        let err = parse_page_args(&args(json!({ "first": bad }))).expect_err("bad first");
        assert_eq!(err.code, ErrorCode::InvalidArguments);
        assert_eq!(err.details["field_errors"][0]["parameter"], "first");
    }
}

#[test]
fn sizes_beyond_the_signed_range_exceed_the_ceiling() {
    for key in ["first", "last"] {
        let mut raw = Map::new();
        raw.insert(key.to_string(), json!(u64::MAX));
        let parsed = parse_page_args(&raw).expect("integer size");
        let err: ApiError = parsed
            .resolve(&PageLimits::default())
            .expect_err("above ceiling")
            .into();
        assert_eq!(err.code, ErrorCode::PageSizeExceeded, "{key}");
    }
}

#[test]
fn oversized_cursor_is_invalid_cursor() {
    let huge = "a".repeat(MAX_CURSOR_BYTES + 1);
    let err = parse_page_args(&args(json!({ "before": huge }))).expect_err("huge");
    assert_eq!(err.code, ErrorCode::InvalidCursor);
}

#[test]
fn sort_order_validates_field_and_direction() {
    let order = parse_sort_order(&args(json!({"sortBy": "name", "direction": "DESC"})), &schema())
        .expect("order");
    assert_eq!(order.direction, SortDirection::Desc);
    assert_eq!(order.sort_field.as_ref().map(FieldName::as_str), Some("name"));

    let by_id = parse_sort_order(&Map::new(), &schema()).expect("default");
    assert!(by_id.sort_field.is_none());

    let err = parse_sort_order(&args(json!({"sortBy": "score"})), &schema()).expect_err("float");
    assert_eq!(err.code, ErrorCode::InvalidArguments);
    let err = parse_sort_order(&args(json!({"sortBy": "nope"})), &schema()).expect_err("unknown");
    assert_eq!(err.code, ErrorCode::InvalidArguments);
    let err =
        parse_sort_order(&args(json!({"direction": "sideways"})), &schema()).expect_err("dir");
    assert_eq!(err.code, ErrorCode::InvalidArguments);
}

#[test]
fn global_id_arg_maps_codec_errors() {
    let ids = IdCodec::new([TypeName::new("User").expect("type")]);
    let encoded = ids.encode_parts("User", "9").expect("encode");
    let id = parse_global_id_arg(&args(json!({ "id": encoded })), "id", &ids).expect("id");
    assert_eq!(id.local_id(), "9");

    let err = parse_global_id_arg(&args(json!({"id": "!!"})), "id", &ids).expect_err("alphabet");
    assert_eq!(err.code, ErrorCode::InvalidIdentifier);
    let err = parse_global_id_arg(&Map::new(), "id", &ids).expect_err("missing");
    assert_eq!(err.code, ErrorCode::InvalidArguments);
}

#[test]
fn update_input_keeps_absent_null_and_value_apart() {
    let input = parse_update_input(&args(json!({"input": {"name": "x", "score": null}})), "input")
        .expect("input");
    assert_eq!(input.get("name"), UpdateValue::Value(&json!("x")));
    assert_eq!(input.get("score"), UpdateValue::Null);
    assert_eq!(input.get("other"), UpdateValue::Absent);

    let err = parse_update_input(&args(json!({"input": [1]})), "input").expect_err("array");
    assert_eq!(err.code, ErrorCode::InvalidArguments);
    assert!(parse_create_input(&Map::new(), "input").is_err());
}

#[test]
fn unknown_args_are_listed() {
    let err = reject_unknown_args(&args(json!({"first": 1, "limit": 3, "page": 2})), &PAGE_ARGS)
        .expect_err("unknown");
    assert_eq!(err.code, ErrorCode::InvalidArguments);
    assert_eq!(err.details["field_errors"].as_array().map(Vec::len), Some(2));
}
