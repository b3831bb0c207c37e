use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use config_formats::{normalize, registry, value, Kind, NormalizationPolicy, Timestamp, Value};

fn parse_all() -> NormalizationPolicy {
    NormalizationPolicy::new()
        .with_parse_str(true)
        .with_parse_date(true)
        .with_allow_date(true)
}

#[test]
fn test_text_to_simple_types() {
    let datetime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2020, 2, 20).unwrap(),
        NaiveTime::from_hms_opt(12, 34, 56).unwrap(),
    );
    let cases = [
        ("42", Value::Integer(42)),
        ("1.0", Value::Float(1.0)),
        (" 0.1", Value::Float(0.1)),
        ("null", Value::Null),
        ("true", Value::Bool(true)),
        ("Off", Value::Bool(false)),
        ("bla ", Value::from("bla ")),
        ("2020-02-20", Value::from(NaiveDate::from_ymd_opt(2020, 2, 20).unwrap())),
        ("12:34:56", Value::from(NaiveTime::from_hms_opt(12, 34, 56).unwrap())),
        ("2020-02-20T12:34:56", Value::from(Timestamp::local(datetime))),
    ];
    let policy = parse_all();
    for (text, expected) in cases {
        let result = normalize(&Value::from(text), &policy);
        assert_eq!(result, expected, "{text:?}");
        assert_eq!(result.kind(), expected.kind(), "{text:?}");
    }
}

#[test]
fn test_numbers_must_print_back_exactly() {
    let policy = NormalizationPolicy::new().with_parse_str(true);
    for text in ["007", "1.50", "+3", "1_000", "0x10"] {
        assert_eq!(normalize(&Value::from(text), &policy), Value::from(text), "{text:?}");
    }
}

#[test]
fn test_dates_render_as_text_by_default() {
    let date = Value::from(NaiveDate::from_ymd_opt(2020, 2, 20).unwrap());
    let out = normalize(&value!({"d": date}), &NormalizationPolicy::new());
    assert_eq!(out, value!({"d": "2020-02-20"}));
}

#[test]
fn test_null_handling() {
    let mut map = config_formats::Mapping::new();
    map.push(Value::Null, value!(1));
    map.push("a", Value::Null);
    map.push("b", value!(2));
    let source = Value::Mapping(map);

    let keep = normalize(&source, &NormalizationPolicy::new());
    assert_eq!(keep, source);

    let skip = NormalizationPolicy::new()
        .with_skip_null_keys(true)
        .with_skip_null_values(true);
    assert_eq!(normalize(&source, &skip), value!({"b": 2}));
}

#[test]
fn test_simple_lists() {
    let split = NormalizationPolicy::new()
        .with_parse_simple_lists(true)
        .with_parse_str(true);
    assert_eq!(normalize(&value!("1;2;3"), &split), value!([1, 2, 3]));
    // one separator is not a list
    assert_eq!(normalize(&value!("a;b"), &split), value!("a;b"));

    let final_sep = split.clone().with_simple_list_separator(";", true);
    assert_eq!(normalize(&value!("a;b;"), &final_sep), value!(["a", "b"]));
    assert_eq!(normalize(&value!("a;b;c"), &final_sep), value!("a;b;c"));

    let join = NormalizationPolicy::new()
        .with_join_simple_lists(true)
        .with_simple_list_separator(",", false);
    assert_eq!(normalize(&value!([1, "x", true]), &join), value!("1,x,true"));
    assert_eq!(normalize(&value!([1, [2]]), &join), value!([1, "2"]));
}

#[test]
fn test_simple_types_restrict_joining() {
    let join = NormalizationPolicy::new()
        .with_join_simple_lists(true)
        .with_simple_types(&[Kind::Integer]);
    assert_eq!(normalize(&value!([1, 2]), &join), value!("1;2"));
    assert_eq!(normalize(&value!([1, "a"]), &join), value!([1, "a"]));
}

#[test]
fn test_force_string_keys() {
    let mut map = config_formats::Mapping::new();
    map.push(1, value!("one"));
    map.push(true, value!("yes"));
    let out = normalize(
        &Value::Mapping(map),
        &NormalizationPolicy::new().with_force_string_keys(true),
    );
    assert_eq!(out, value!({"1": "one", "true": "yes"}));
}

#[test]
fn test_max_level_with_codec_serializer() {
    let policy = NormalizationPolicy::new().with_max_level(1, "json");
    let normalizer = registry::global().normalizer(policy);
    let out = normalizer.normalize(&value!({"a": {"b": [1, 2]}, "c": [3]}));
    assert_eq!(out, value!({"a": r#"{"b":[1,2]}"#, "c": "[3]"}));
}

#[test]
fn test_max_level_reparses_text() {
    let policy = NormalizationPolicy::new()
        .with_parse_str(true)
        .with_max_level(1, "json");
    let normalizer = registry::global().normalizer(policy);
    let out = normalizer.normalize(&value!({"a": "{\"b\": \"2\"}", "c": "plain"}));
    assert_eq!(out, value!({"a": {"b": 2}, "c": "plain"}));
}

#[test]
fn test_input_is_untouched() {
    let source = value!({"a": "1;2;", "b": null});
    let before = source.clone();
    let _ = normalize(
        &source,
        &parse_all()
            .with_parse_simple_lists(true)
            .with_skip_null_values(true),
    );
    assert_eq!(source, before);
}

#[test]
fn test_plain_tree_is_unchanged() {
    let plain = value!([1, 2.0, ["hello", "world", {"foo": 42, "nothing": null}], true, false, 0]);
    assert_eq!(normalize(&plain, &NormalizationPolicy::new()), plain);
    assert_eq!(normalize(&value!("Test"), &NormalizationPolicy::new()), value!("Test"));
}

#[test]
fn test_big_integers_narrow_without_loss() {
    let small = Value::from(num_bigint::BigInt::from(42));
    assert_eq!(normalize(&small, &NormalizationPolicy::new()), Value::Integer(42));

    let huge = Value::from(num_bigint::BigInt::from(10u8).pow(30));
    assert_eq!(normalize(&huge, &NormalizationPolicy::new()), huge);
}

#[test]
fn test_single_item_lists_with_final_separator() {
    let split = NormalizationPolicy::new()
        .with_parse_simple_lists(true)
        .with_simple_list_separator(";", true);
    assert_eq!(normalize(&value!("only;"), &split), value!(["only"]));
    assert_eq!(normalize(&value!(";"), &split), value!([]));
    assert_eq!(normalize(&value!("only"), &split), value!("only"));
}
