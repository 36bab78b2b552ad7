use graft_core::{canonical, sha256_hex};
use serde_json::json;

#[test]
fn stable_json_bytes_are_key_order_deterministic() {
    let a = json!({"z": 2, "a": 1});
    let b = json!({"a": 1, "z": 2});
    let ba = canonical::stable_json_bytes(&a).expect("stable json a");
    let bb = canonical::stable_json_bytes(&b).expect("stable json b");
    assert_eq!(ba, bb);
}

#[test]
fn sha256_is_repeatable_for_same_bytes() {
    let bytes = b"graft-core-determinism";
    assert_eq!(sha256_hex(bytes), sha256_hex(bytes));
}

#[test]
fn short_hex_truncates_to_requested_byte_count() {
    let hash = canonical::stable_json_hash(&json!({"field": "created_at"})).expect("hash");
    assert_eq!(hash.short_hex(8).len(), 16);
    assert!(hash.to_hex().starts_with(&hash.short_hex(8)));
    assert_eq!(hash.prefix(4).len(), 4);
    assert_eq!(hash.prefix(64).len(), 32);
}

#[test]
fn fingerprint_ignores_key_order_in_nested_objects() {
    let a = json!({"order": {"field": "title", "direction": "asc"}, "source": "Post"});
    let b = json!({"source": "Post", "order": {"direction": "asc", "field": "title"}});
    assert_eq!(
        canonical::fingerprint(&a, 8).expect("fingerprint a"),
        canonical::fingerprint(&b, 8).expect("fingerprint b")
    );
    assert_ne!(
        canonical::fingerprint(&a, 8).expect("fingerprint a"),
        canonical::fingerprint(&json!({"source": "User"}), 8).expect("fingerprint user")
    );
}
