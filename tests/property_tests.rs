//! Property-based tests for the guarantees every conversion relies on:
//! normalization is idempotent and leaves its input alone, the lossless
//! codecs round-trip, and dotted paths split back into their segments.

use config_formats::wrap::split_path;
use config_formats::{normalize, registry, wrap, Mapping, NormalizationPolicy, Value};
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z0-9 ]{0,12}".prop_map(Value::Text),
    ]
}

fn mapping(entries: Vec<(String, Value)>) -> Value {
    let mut map = Mapping::with_capacity(entries.len());
    for (key, value) in entries {
        map.insert(key, value);
    }
    Value::Mapping(map)
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Sequence),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..5).prop_map(mapping),
        ]
    })
}

fn document() -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-z]{1,6}", tree()), 0..5).prop_map(mapping)
}

fn list_item() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e6f64..1.0e6).prop_map(Value::Float),
        "x[a-z]{0,5}".prop_map(Value::Text),
    ]
}

fn roundtrip(format: &str, value: &Value) -> bool {
    let registry = registry::global();
    match registry.encode(format, value, false) {
        Ok(bytes) => match registry.decode(format, &bytes, true) {
            Ok(decoded) => *value == decoded,
            Err(e) => {
                eprintln!("Decode failed: {}", e);
                false
            }
        },
        Err(e) => {
            eprintln!("Encode failed: {}", e);
            false
        }
    }
}

proptest! {
    #[test]
    fn prop_normalize_idempotent(value in tree()) {
        let policy = NormalizationPolicy::new();
        let once = normalize(&value, &policy);
        prop_assert_eq!(normalize(&once, &policy), once);
    }

    #[test]
    fn prop_default_policy_is_identity_on_plain_trees(value in tree()) {
        prop_assert_eq!(normalize(&value, &NormalizationPolicy::new()), value);
    }

    #[test]
    fn prop_skip_nulls_idempotent(value in tree()) {
        let policy = NormalizationPolicy::new()
            .with_skip_null_values(true)
            .with_force_string_keys(true);
        let once = normalize(&value, &policy);
        prop_assert_eq!(normalize(&once, &policy), once);
    }

    #[test]
    fn prop_integer_text_parses(n in any::<i64>()) {
        let policy = NormalizationPolicy::new().with_parse_str(true);
        prop_assert_eq!(normalize(&Value::Text(n.to_string()), &policy), Value::Integer(n));
    }

    #[test]
    fn prop_simple_list_split_inverts_join(items in prop::collection::vec(list_item(), 3..8)) {
        let list = Value::Sequence(items);
        let join = NormalizationPolicy::new().with_join_simple_lists(true);
        let split = NormalizationPolicy::new()
            .with_parse_simple_lists(true)
            .with_parse_str(true);
        let joined = normalize(&list, &join);
        prop_assert!(joined.is_text());
        prop_assert_eq!(normalize(&joined, &split), list);
    }

    #[test]
    fn prop_json_roundtrip(value in document()) {
        prop_assert!(roundtrip("json", &value));
    }

    #[test]
    fn prop_msgpack_roundtrip(value in tree()) {
        prop_assert!(roundtrip("msgpack", &value));
    }

    #[test]
    fn prop_split_path_inverts_join(segments in prop::collection::vec("[a-z_]{1,8}", 1..5)) {
        prop_assert_eq!(split_path(&segments.join(".")).unwrap(), segments);
    }

    #[test]
    fn prop_quoted_segments(segments in prop::collection::vec("[a-z. ]{0,8}", 1..4)) {
        let path = segments
            .iter()
            .map(|s| format!("'{}'", s))
            .collect::<Vec<_>>()
            .join(".");
        prop_assert_eq!(split_path(&path).unwrap(), segments);
    }

    #[test]
    fn prop_wrap_nests_by_segment(segments in prop::collection::vec("[a-z]{1,6}", 0..4), n in any::<i64>()) {
        let mut current = wrap(&segments.join("."), Value::Integer(n)).unwrap();
        for segment in &segments {
            current = current.get(segment).cloned().unwrap();
        }
        prop_assert_eq!(current, Value::Integer(n));
    }
}
