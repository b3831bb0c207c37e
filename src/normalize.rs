//! The recursive normalization engine.
//!
//! [`Normalizer`] walks a [`Value`] tree depth-first and produces a new tree
//! shaped for a target format, as described by a [`NormalizationPolicy`].
//! The input is never modified, and normalization cannot fail: every leaf
//! has a textual fallback.
//!
//! Depth starts at 0 for the root and grows by one per mapping or sequence
//! descent. When a policy sets `max_level`, containers found at that depth
//! are handed to a [`SubtreeSerializer`] and replaced by the text it
//! produces. The serializer is injected, which keeps the engine independent
//! of the format registry.
//!
//! ## Examples
//!
//! ```rust
//! use config_formats::{value, NormalizationPolicy, Normalizer, Value};
//!
//! let normalizer = Normalizer::new(
//!     NormalizationPolicy::new()
//!         .with_parse_str(true)
//!         .with_skip_null_values(true),
//! );
//!
//! let raw = value!({"port": "8080", "debug": "off", "proxy": null});
//! assert_eq!(normalizer.normalize(&raw), value!({"port": 8080, "debug": false}));
//! ```

use crate::datetime::{parse_date, parse_datetime, parse_time};
use crate::value::float_repr;
use crate::{Mapping, NormalizationPolicy, Result, Value};
use num_bigint::BigInt;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Serializes a subtree to text and reads it back.
///
/// This is the only capability the engine needs from a codec; the registry
/// provides one for every registered format.
pub trait SubtreeSerializer: Send + Sync {
    /// Renders a whole subtree as text.
    fn serialize_subtree(&self, value: &Value) -> Result<String>;

    /// Parses text produced by [`serialize_subtree`](Self::serialize_subtree).
    fn deserialize_subtree(&self, text: &str) -> Result<Value>;
}

/// Applies a [`NormalizationPolicy`] to value trees.
///
/// Construct once per conversion; [`normalize`](Normalizer::normalize) is
/// pure and may be called any number of times.
#[derive(Clone)]
pub struct Normalizer {
    policy: NormalizationPolicy,
    subtree: Option<Arc<dyn SubtreeSerializer>>,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("policy", &self.policy.to_string())
            .field("subtree", &self.subtree.is_some())
            .finish()
    }
}

impl Normalizer {
    /// Creates a normalizer without a subtree serializer.
    ///
    /// Subtrees reaching `max_level` then fall back to their `Display` text.
    #[must_use]
    pub fn new(policy: NormalizationPolicy) -> Self {
        Normalizer {
            policy,
            subtree: None,
        }
    }

    /// Injects the serializer used for subtrees at `max_level`.
    #[must_use]
    pub fn with_subtree_serializer(mut self, serializer: Arc<dyn SubtreeSerializer>) -> Self {
        self.subtree = Some(serializer);
        self
    }

    /// Returns the policy this normalizer applies.
    #[must_use]
    pub fn policy(&self) -> &NormalizationPolicy {
        &self.policy
    }

    /// Normalizes a whole tree, starting at depth 0.
    #[must_use]
    pub fn normalize(&self, value: &Value) -> Value {
        self.normalize_at(value, 0)
    }

    fn normalize_at(&self, value: &Value, level: usize) -> Value {
        let policy = &self.policy;
        match value {
            Value::Null => Value::Null,
            v if policy.allow_date && v.is_temporal() => v.clone(),
            Value::Text(s) => self.normalize_text(s, level),
            // integers keep full precision; only narrow when nothing is lost
            Value::BigInt(big) => match i64::try_from(big) {
                Ok(i) => Value::Integer(i),
                Err(_) => value.clone(),
            },
            v if v.kind().is_leaf() && policy.is_simple(v.kind()) => v.clone(),
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) => value.clone(),
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) => Value::Text(value.to_string()),
            Value::Mapping(map) => self.normalize_mapping(value, map, level),
            Value::Sequence(items) => self.normalize_sequence(value, items, level),
            Value::Bytes(_) => Value::Text(value.to_text()),
        }
    }

    fn normalize_text(&self, s: &str, level: usize) -> Value {
        if self.policy.parse_simple_lists {
            if let Some(items) = self.split_simple_list(s) {
                return Value::Sequence(
                    items
                        .into_iter()
                        .map(|item| self.convert_text(item, level + 1))
                        .collect(),
                );
            }
        }
        self.convert_text(s, level)
    }

    /// Token, date and number detection for a single text leaf.
    fn convert_text(&self, s: &str, level: usize) -> Value {
        let policy = &self.policy;
        let trimmed = s.trim();
        let folded = trimmed.to_lowercase();

        if policy.parse_str {
            if let Some(token) = policy.special_tokens.get(&folded) {
                return token.clone();
            }
        }

        if policy.parse_date {
            if let Some(date) = parse_date(trimmed) {
                return Value::Date(date);
            }
            if let Some(time) = parse_time(trimmed) {
                return Value::Time(time);
            }
            if let Some(ts) = parse_datetime(trimmed) {
                return Value::DateTime(ts);
            }
        }

        if policy.parse_str {
            // only accept numbers that print back exactly as written
            if let Ok(i) = folded.parse::<i64>() {
                if i.to_string() == folded {
                    return Value::Integer(i);
                }
            } else if let Ok(big) = folded.parse::<BigInt>() {
                if big.to_string() == folded {
                    return Value::BigInt(big);
                }
            }
            if let Ok(f) = folded.parse::<f64>() {
                if float_repr(f) == folded {
                    return Value::Float(f);
                }
            }

            if policy.max_level == Some(level) {
                if let Some(serializer) = &self.subtree {
                    if let Ok(parsed) = serializer.deserialize_subtree(s) {
                        trace!(level, "re-parsed text leaf at max level");
                        return self.normalize_at(&parsed, level + 1);
                    }
                }
            }
        }

        Value::Text(s.to_string())
    }

    /// Splits `s` when it holds at least two separators. In final-separator
    /// mode one separator is enough, but the text must end with it; the empty
    /// tail is dropped and a lone separator is the empty list.
    fn split_simple_list<'a>(&self, s: &'a str) -> Option<Vec<&'a str>> {
        let separator = self.policy.simple_list_separator.as_str();
        if separator.is_empty() {
            return None;
        }
        if self.policy.simple_list_final_separator {
            let body = s.trim().strip_suffix(separator)?;
            if body.trim().is_empty() {
                return Some(Vec::new());
            }
            return Some(body.split(separator).map(str::trim).collect());
        }
        if s.matches(separator).count() < 2 {
            return None;
        }
        Some(s.split(separator).map(str::trim).collect())
    }

    fn is_simple_leaf(&self, value: &Value) -> bool {
        let kind = value.kind();
        kind.is_leaf() && self.policy.is_simple(kind)
    }

    fn join_simple_list(&self, items: &[Value]) -> String {
        let separator = self.policy.simple_list_separator.as_str();
        let mut joined = items
            .iter()
            .map(Value::to_text)
            .collect::<Vec<_>>()
            .join(separator);
        if self.policy.simple_list_final_separator {
            joined.push_str(separator);
        }
        joined
    }

    fn normalize_mapping(&self, value: &Value, map: &Mapping, level: usize) -> Value {
        if self.policy.max_level == Some(level) {
            return self.escape_subtree(value, level);
        }

        let policy = &self.policy;
        let mut out = Mapping::with_capacity(map.len());
        for (key, item) in map {
            if key.is_null() && policy.skip_null_keys {
                continue;
            }
            if item.is_null() && policy.skip_null_values {
                continue;
            }
            let key = if policy.force_string_keys {
                Value::Text(key.to_text())
            } else {
                self.normalize_at(key, level + 1)
            };
            out.insert(key, self.normalize_at(item, level + 1));
        }
        Value::Mapping(out)
    }

    fn normalize_sequence(&self, value: &Value, items: &[Value], level: usize) -> Value {
        if self.policy.join_simple_lists && items.iter().all(|item| self.is_simple_leaf(item)) {
            return Value::Text(self.join_simple_list(items));
        }
        if self.policy.max_level == Some(level) {
            return self.escape_subtree(value, level);
        }
        Value::Sequence(
            items
                .iter()
                .map(|item| self.normalize_at(item, level + 1))
                .collect(),
        )
    }

    fn escape_subtree(&self, value: &Value, level: usize) -> Value {
        let format = self.policy.max_level_format.as_str();
        match &self.subtree {
            Some(serializer) => match serializer.serialize_subtree(value) {
                Ok(text) => {
                    trace!(level, format, "serialized subtree at max level");
                    Value::Text(text)
                }
                Err(err) => {
                    warn!(level, format, error = %err, "cannot serialize subtree, using plain text");
                    Value::Text(value.to_text())
                }
            },
            None => {
                warn!(level, format, "no subtree serializer configured, using plain text");
                Value::Text(value.to_text())
            }
        }
    }
}

/// Normalizes `value` with a one-off [`Normalizer`] for `policy`.
///
/// Subtrees reaching `max_level` are rendered with their `Display` text; use
/// [`Registry::normalizer`](crate::Registry::normalizer) to serialize them
/// through the named codec instead.
#[must_use]
pub fn normalize(value: &Value, policy: &NormalizationPolicy) -> Value {
    Normalizer::new(policy.clone()).normalize(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{value, Error, Kind};
    use chrono::{NaiveDate, NaiveTime};
    use num_bigint::BigInt;

    fn parsing() -> Normalizer {
        Normalizer::new(
            NormalizationPolicy::new()
                .with_parse_str(true)
                .with_parse_date(true),
        )
    }

    #[test]
    fn test_parse_str_tokens() {
        let n = parsing();
        for (text, expected) in [
            ("true", Value::Bool(true)),
            (" YES ", Value::Bool(true)),
            ("On", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("no", Value::Bool(false)),
            ("OFF", Value::Bool(false)),
            ("null", Value::Null),
            ("None", Value::Null),
            ("nil", Value::Null),
        ] {
            assert_eq!(n.normalize(&Value::from(text)), expected, "{text:?}");
        }
    }

    #[test]
    fn test_parse_str_numbers() {
        let n = parsing();
        assert_eq!(n.normalize(&value!("42")), Value::Integer(42));
        assert_eq!(n.normalize(&value!("-3")), Value::Integer(-3));
        assert_eq!(n.normalize(&value!("1.0")), Value::Float(1.0));
        assert_eq!(n.normalize(&value!(" 0.1")), Value::Float(0.1));
        assert_eq!(n.normalize(&value!("bla ")), value!("bla "));
    }

    #[test]
    fn test_parse_str_rejects_reformatting() {
        let n = parsing();
        for text in ["007", "+5", "1.", "1e5", "1_000", "-0"] {
            assert_eq!(n.normalize(&Value::from(text)), Value::from(text), "{text:?}");
        }
    }

    #[test]
    fn test_parse_date() {
        let n = parsing();
        assert_eq!(
            n.normalize(&value!("2020-02-20")),
            Value::Date(NaiveDate::from_ymd_opt(2020, 2, 20).unwrap())
        );
        assert_eq!(
            n.normalize(&value!("12:34:56")),
            Value::Time(NaiveTime::from_hms_opt(12, 34, 56).unwrap())
        );
        match n.normalize(&value!("2020-02-20T12:34:56")) {
            Value::DateTime(ts) => {
                assert_eq!(ts.to_string(), "2020-02-20T12:34:56");
                assert_eq!(ts.offset, None);
            }
            other => panic!("expected datetime, got {other:?}"),
        }
        assert_eq!(n.normalize(&value!("20-02-2020")), value!("20-02-2020"));
    }

    #[test]
    fn test_parse_date_without_parse_str() {
        let n = Normalizer::new(NormalizationPolicy::new().with_parse_date(true));
        assert_eq!(n.normalize(&value!("21:00")).kind(), Kind::Time);
        assert_eq!(n.normalize(&value!("42")), value!("42"));
    }

    #[test]
    fn test_dates_rendered_unless_allowed() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 2, 20).unwrap());
        let time = Value::Time(NaiveTime::from_hms_opt(21, 0, 0).unwrap());

        let dumb = Normalizer::new(NormalizationPolicy::new());
        assert_eq!(dumb.normalize(&date), value!("2020-02-20"));
        assert_eq!(dumb.normalize(&time), value!("21:00:00"));

        let keep = Normalizer::new(NormalizationPolicy::new().with_allow_date(true));
        assert_eq!(keep.normalize(&date), date);
    }

    #[test]
    fn test_date_as_simple_type_passes_through() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2020, 2, 20).unwrap());
        let n = Normalizer::new(
            NormalizationPolicy::new().with_simple_types(&[Kind::Text, Kind::Date]),
        );
        assert_eq!(n.normalize(&date), date);
    }

    #[test]
    fn test_bigint_narrowed_only_when_exact() {
        let n = Normalizer::new(NormalizationPolicy::new());
        assert_eq!(n.normalize(&Value::BigInt(BigInt::from(12))), Value::Integer(12));
        assert_eq!(n.normalize(&Value::from(u64::MAX)), Value::from(u64::MAX));

        let joined = Normalizer::new(NormalizationPolicy::new().with_join_simple_lists(true));
        assert_eq!(
            joined.normalize(&Value::Sequence(vec![Value::from(u64::MAX), Value::Integer(1)])),
            value!("18446744073709551615;1")
        );
    }

    #[test]
    fn test_parse_str_big_integers() {
        let n = parsing();
        assert_eq!(n.normalize(&value!("18446744073709551615")), Value::from(u64::MAX));
        assert_eq!(n.normalize(&value!("0018446744073709551615")), value!("0018446744073709551615"));
    }

    #[test]
    fn test_bytes_fall_back_to_text() {
        let n = Normalizer::new(NormalizationPolicy::new());
        assert_eq!(n.normalize(&Value::Bytes(b"ab".to_vec())), value!("b\"ab\""));
    }

    #[test]
    fn test_skip_null_values() {
        let raw = value!({"a": null, "b": 1});

        let skip = Normalizer::new(NormalizationPolicy::new().with_skip_null_values(true));
        assert_eq!(skip.normalize(&raw), value!({"b": 1}));

        let keep = Normalizer::new(NormalizationPolicy::new());
        assert_eq!(keep.normalize(&raw), value!({"a": null, "b": 1}));
    }

    #[test]
    fn test_skip_null_keys() {
        let mut map = Mapping::new();
        map.push(Value::Null, value!(1));
        map.push("b", value!(2));
        let raw = Value::Mapping(map);

        let skip = Normalizer::new(NormalizationPolicy::new().with_skip_null_keys(true));
        assert_eq!(skip.normalize(&raw), value!({"b": 2}));
    }

    #[test]
    fn test_force_string_keys_and_dedup() {
        let mut map = Mapping::new();
        map.push(1, value!("int"));
        map.push(true, value!("bool"));
        map.push("1", value!("text"));
        let raw = Value::Mapping(map);

        let n = Normalizer::new(NormalizationPolicy::new().with_force_string_keys(true));
        assert_eq!(n.normalize(&raw), value!({"1": "text", "true": "bool"}));
    }

    #[test]
    fn test_keys_normalized_without_force() {
        let mut map = Mapping::new();
        map.push("7", value!("seven"));
        let n = Normalizer::new(NormalizationPolicy::new().with_parse_str(true));
        let out = n.normalize(&Value::Mapping(map));
        assert_eq!(
            out.as_mapping().and_then(|m| m.get_value(&Value::Integer(7))),
            Some(&value!("seven"))
        );
    }

    #[test]
    fn test_split_simple_list() {
        let n = Normalizer::new(
            NormalizationPolicy::new()
                .with_parse_simple_lists(true)
                .with_parse_str(true),
        );
        assert_eq!(n.normalize(&value!("a; 2 ;yes")), value!(["a", 2, true]));
        // exactly one separator never splits
        assert_eq!(n.normalize(&value!("a;b")), value!("a;b"));
        assert_eq!(n.normalize(&value!(";a;b")), value!(["", "a", "b"]));
    }

    #[test]
    fn test_split_runs_before_parse_str() {
        let n = Normalizer::new(
            NormalizationPolicy::new()
                .with_parse_simple_lists(true)
                .with_parse_str(true)
                .with_simple_list_separator(".", false),
        );
        assert_eq!(n.normalize(&value!("1.2.3")), value!([1, 2, 3]));
        assert_eq!(n.normalize(&value!("1.5")), Value::Float(1.5));
    }

    #[test]
    fn test_split_final_separator() {
        let n = Normalizer::new(
            NormalizationPolicy::new()
                .with_parse_simple_lists(true)
                .with_simple_list_separator(",", true),
        );
        assert_eq!(n.normalize(&value!("a,b, ")), value!(["a", "b"]));
        assert_eq!(n.normalize(&value!("a,b,c")), value!("a,b,c"));
        assert_eq!(n.normalize(&value!("only,")), value!(["only"]));
        assert_eq!(n.normalize(&value!(" , ")), value!([]));
        assert_eq!(n.normalize(&value!("a,b")), value!("a,b"));
    }

    #[test]
    fn test_join_simple_list() {
        let n = Normalizer::new(NormalizationPolicy::new().with_join_simple_lists(true));
        assert_eq!(n.normalize(&value!(["a", 2, 1.0, true, null])), value!("a;2;1.0;true;null"));
        // nested containers are not simple
        assert_eq!(n.normalize(&value!(["a", ["b"]])), value!(["a", "b"]));

        let fin = Normalizer::new(
            NormalizationPolicy::new()
                .with_join_simple_lists(true)
                .with_simple_list_separator("|", true),
        );
        assert_eq!(fin.normalize(&value!(["x", "y"])), value!("x|y|"));
    }

    #[test]
    fn test_split_join_inverse() {
        let policy = NormalizationPolicy::new()
            .with_parse_simple_lists(true)
            .with_join_simple_lists(true)
            .with_parse_str(true);
        let n = Normalizer::new(policy.clone());
        let list = value!(["alpha", 3, 2.5, false]);
        let joined = n.normalize(&list);
        assert_eq!(joined, value!("alpha;3;2.5;false"));
        assert_eq!(n.normalize(&joined), list);

        let fin = Normalizer::new(policy.with_simple_list_separator(",", true));
        let pair = value!(["x", 1]);
        assert_eq!(fin.normalize(&fin.normalize(&pair)), pair);
    }

    struct Brackets;

    impl SubtreeSerializer for Brackets {
        fn serialize_subtree(&self, value: &Value) -> Result<String> {
            Ok(format!("<{}>", value))
        }

        fn deserialize_subtree(&self, text: &str) -> Result<Value> {
            text.strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(|inner| Value::Sequence(inner.split(',').map(Value::from).collect()))
                .ok_or_else(|| Error::decode("brackets", "missing brackets"))
        }
    }

    #[test]
    fn test_max_level_escape() {
        let n = Normalizer::new(NormalizationPolicy::new().with_max_level(1, "brackets"))
            .with_subtree_serializer(Arc::new(Brackets));
        let raw = value!({"flat": 1, "deep": {"x": [1, 2]}, "list": [1]});
        assert_eq!(
            n.normalize(&raw),
            value!({"flat": 1, "deep": "<{\"x\": [1, 2]}>", "list": "<[1]>"})
        );
    }

    #[test]
    fn test_max_level_reparse_text() {
        let n = Normalizer::new(
            NormalizationPolicy::new()
                .with_parse_str(true)
                .with_max_level(1, "brackets"),
        )
        .with_subtree_serializer(Arc::new(Brackets));
        let raw = value!({"deep": "<a,b>", "plain": "hello", "num": "5"});
        assert_eq!(
            n.normalize(&raw),
            value!({"deep": ["a", "b"], "plain": "hello", "num": 5})
        );
    }

    #[test]
    fn test_max_level_without_serializer_uses_display() {
        let n = Normalizer::new(NormalizationPolicy::new().with_max_level(0, "json"));
        assert_eq!(n.normalize(&value!({"a": "b"})), value!("{\"a\": \"b\"}"));
    }

    #[test]
    fn test_input_untouched() {
        let raw = value!({"a": null, "b": "1"});
        let copy = raw.clone();
        let _ = normalize(
            &raw,
            &NormalizationPolicy::new()
                .with_skip_null_values(true)
                .with_parse_str(true),
        );
        assert_eq!(raw, copy);
    }

    #[test]
    fn test_dumb_down_idempotent() {
        let already_dumb = value!([1, 2.0, ["hello", "world", {"foo": 42, "nothing": null}], true, false, 0]);
        let policy = NormalizationPolicy::new();
        assert_eq!(normalize(&already_dumb, &policy), already_dumb);
        assert_eq!(normalize(&value!("Test"), &policy), value!("Test"));
    }
}
