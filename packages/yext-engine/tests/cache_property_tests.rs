//! Property tests for cache keys

use proptest::prelude::*;
use serde_yaml::{Mapping, Value};
use yext_engine::features::cache::{ContentHash, ParamHash};
use yext_engine::Params;

fn entries() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 1..8)
        .prop_map(|map| map.into_iter().collect())
}

fn mapping(entries: &[(String, i64)]) -> Value {
    let mut map = Mapping::new();
    for (k, v) in entries {
        map.insert(Value::from(k.as_str()), Value::from(*v));
    }
    Value::Mapping(map)
}

proptest! {
    #[test]
    fn prop_param_order_does_not_change_key(entries in entries()) {
        let forward = Params::from_pairs(entries.iter().cloned());
        let backward = Params::from_pairs(entries.iter().rev().cloned());

        prop_assert_eq!(
            ParamHash::compute(&forward, true),
            ParamHash::compute(&backward, true)
        );
    }

    #[test]
    fn prop_nested_mapping_order_does_not_change_key(entries in entries()) {
        let reversed: Vec<_> = entries.iter().rev().cloned().collect();
        let a = Params::from_pairs([("config", mapping(&entries))]);
        let b = Params::from_pairs([("config", mapping(&reversed))]);

        prop_assert_eq!(ParamHash::compute(&a, false), ParamHash::compute(&b, false));
    }

    #[test]
    fn prop_extra_param_changes_key(entries in entries(), extra in "[A-Z]{1,8}") {
        let base = Params::from_pairs(entries.iter().cloned());
        let mut extended = base.clone();
        extended.insert(extra, "x");

        prop_assert_ne!(
            ParamHash::compute(&base, true),
            ParamHash::compute(&extended, true)
        );
    }

    #[test]
    fn prop_filter_flag_changes_key(entries in entries()) {
        let params = Params::from_pairs(entries);
        prop_assert_ne!(
            ParamHash::compute(&params, true),
            ParamHash::compute(&params, false)
        );
    }

    #[test]
    fn prop_content_hash_is_hex_sha256(text in ".*") {
        let hash = ContentHash::compute(&text);
        prop_assert_eq!(hash.as_str().len(), 64);
        prop_assert!(hash.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
