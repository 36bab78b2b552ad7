use graft_core::{ErrorCode, FieldName, TypeName, ERROR_CODES};

#[test]
fn type_name_rejects_reserved_delimiter() {
    let err = TypeName::new("User:1").expect_err("delimiter is reserved");
    assert!(err.to_string().contains("type_name"));
    assert_eq!(err.code(), ErrorCode::InvalidIdentifier);
}

#[test]
fn field_name_rejects_empty() {
    let err = FieldName::new("").expect_err("must reject empty");
    assert!(err.to_string().contains("must not be empty"));
}

#[test]
fn type_name_serde_roundtrip_contract() {
    let name = TypeName::new("User").expect("valid type name");
    let serialized = serde_json::to_string(&name).expect("serialize");
    assert_eq!(serialized, "\"User\"");
    let restored: TypeName = serde_json::from_str(&serialized).expect("deserialize");
    assert_eq!(restored, name);
}

#[test]
fn type_name_serde_rejects_invalid_value() {
    let parsed: Result<TypeName, _> = serde_json::from_str("\"Bad Name\"");
    assert!(parsed.is_err(), "space should fail invariant");
}

#[test]
fn error_code_strings_are_unique_and_stable() {
    let mut seen = std::collections::BTreeSet::new();
    for code in ERROR_CODES {
        assert!(seen.insert(code.as_str()), "duplicate code {code}");
        let json = serde_json::to_string(code).expect("serialize code");
        assert_eq!(json, format!("\"{}\"", code.as_str()));
    }
    assert!(ErrorCode::MissingResolver.is_startup_fatal());
    assert!(!ErrorCode::InvalidCursor.is_startup_fatal());
}
