use graft_core::{canonical, TypeName};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn stable_hash_bytes_is_deterministic(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
        prop_assert_eq!(canonical::sha256(&payload), canonical::sha256(&payload));
    }

    #[test]
    fn stable_json_bytes_are_independent_of_object_key_order(
        a in "[a-z_]{1,16}",
        b in "[a-z_]{1,16}",
        av in any::<u32>(),
        bv in any::<u32>()
    ) {
        prop_assume!(a != b);
        let left = json!({a.clone(): av, b.clone(): bv});
        let right = json!({b: bv, a: av});
        prop_assert_eq!(
            canonical::stable_json_bytes(&left).expect("canonical left"),
            canonical::stable_json_bytes(&right).expect("canonical right")
        );
    }

    #[test]
    fn graphql_style_names_are_accepted(name in "[A-Za-z_][A-Za-z0-9_]{0,40}") {
        prop_assert!(TypeName::new(name).is_ok());
    }
}
