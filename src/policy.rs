//! Configuration for the normalization engine.
//!
//! This module provides:
//!
//! - [`NormalizationPolicy`]: the options record driving [`Normalizer`]
//! - [`default_special_tokens`]: the token table used by `parse_str`
//!
//! A policy has no runtime state beyond its fields. It is built once per
//! conversion, either with the builder methods or by deserializing it from
//! any supported format (missing fields take their defaults).
//!
//! ## Examples
//!
//! ```rust
//! use config_formats::NormalizationPolicy;
//!
//! // What TOML needs: no nulls, string keys, native dates
//! let policy = NormalizationPolicy::new()
//!     .with_allow_date(true)
//!     .with_skip_null_values(true)
//!     .with_skip_null_keys(true)
//!     .with_force_string_keys(true);
//!
//! assert_eq!(
//!     policy.to_string(),
//!     "allow_date=true, skip_null_values=true, skip_null_keys=true, force_string_keys=true"
//! );
//! ```
//!
//! [`Normalizer`]: crate::Normalizer

use crate::{Kind, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Returns the default `parse_str` token table.
///
/// `null`, `none` and `nil` map to `Null`; `true`, `on` and `yes` to `true`;
/// `false`, `off` and `no` to `false`.
#[must_use]
pub fn default_special_tokens() -> IndexMap<String, Value> {
    [
        ("null", Value::Null),
        ("none", Value::Null),
        ("nil", Value::Null),
        ("true", Value::Bool(true)),
        ("false", Value::Bool(false)),
        ("on", Value::Bool(true)),
        ("off", Value::Bool(false)),
        ("yes", Value::Bool(true)),
        ("no", Value::Bool(false)),
    ]
    .into_iter()
    .map(|(token, value)| (token.to_string(), value))
    .collect()
}

/// Returns the default simple leaf kinds: bool, integer, float, text, null.
#[must_use]
pub fn default_simple_types() -> Vec<Kind> {
    vec![Kind::Bool, Kind::Integer, Kind::Float, Kind::Text, Kind::Null]
}

/// Options controlling how [`Normalizer`](crate::Normalizer) maps a value
/// tree onto a target format's capabilities.
///
/// All options are independent. The default policy reduces a tree to
/// null, bool, integer, float, text, sequence and mapping without parsing
/// anything out of text.
///
/// # Examples
///
/// ```rust
/// use config_formats::NormalizationPolicy;
///
/// let policy: NormalizationPolicy =
///     serde_json::from_str(r#"{"parse_str": true, "max_level": 2}"#).unwrap();
/// assert!(policy.parse_str);
/// assert_eq!(policy.max_level, Some(2));
/// assert_eq!(policy.simple_list_separator, ";");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationPolicy {
    /// Keep date, time and datetime leaves instead of rendering them as text.
    pub allow_date: bool,
    /// Try to parse text leaves as ISO-8601 date, time or datetime.
    pub parse_date: bool,
    /// Try to turn text leaves into tokens (null/bool), integers and floats.
    pub parse_str: bool,
    /// Case-folded token table consulted by `parse_str`.
    pub special_tokens: IndexMap<String, Value>,
    /// Drop mapping entries whose value is null.
    pub skip_null_values: bool,
    /// Drop mapping entries whose key is null.
    pub skip_null_keys: bool,
    /// Coerce mapping keys to text instead of normalizing them.
    pub force_string_keys: bool,
    /// Split separator-delimited text into sequences.
    pub parse_simple_lists: bool,
    /// Join sequences of simple leaves into separator-delimited text.
    pub join_simple_lists: bool,
    pub simple_list_separator: String,
    /// Simple lists end with the separator.
    pub simple_list_final_separator: bool,
    /// Leaf kinds a simple list may contain.
    pub simple_types: Vec<Kind>,
    /// Depth at which remaining subtrees are serialized to text.
    pub max_level: Option<usize>,
    /// Codec identifier used for subtrees at `max_level`.
    pub max_level_format: String,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        NormalizationPolicy {
            allow_date: false,
            parse_date: false,
            parse_str: false,
            special_tokens: default_special_tokens(),
            skip_null_values: false,
            skip_null_keys: false,
            force_string_keys: false,
            parse_simple_lists: false,
            join_simple_lists: false,
            simple_list_separator: ";".to_string(),
            simple_list_final_separator: false,
            simple_types: default_simple_types(),
            max_level: None,
            max_level_format: "json".to_string(),
        }
    }
}

impl NormalizationPolicy {
    /// Creates the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_allow_date(mut self, allow: bool) -> Self {
        self.allow_date = allow;
        self
    }

    #[must_use]
    pub fn with_parse_date(mut self, parse: bool) -> Self {
        self.parse_date = parse;
        self
    }

    #[must_use]
    pub fn with_parse_str(mut self, parse: bool) -> Self {
        self.parse_str = parse;
        self
    }

    /// Replaces the `parse_str` token table. Tokens are matched against the
    /// trimmed, lowercased text, so they should be lowercase themselves.
    #[must_use]
    pub fn with_special_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        self.special_tokens = tokens.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    #[must_use]
    pub fn with_skip_null_values(mut self, skip: bool) -> Self {
        self.skip_null_values = skip;
        self
    }

    #[must_use]
    pub fn with_skip_null_keys(mut self, skip: bool) -> Self {
        self.skip_null_keys = skip;
        self
    }

    #[must_use]
    pub fn with_force_string_keys(mut self, force: bool) -> Self {
        self.force_string_keys = force;
        self
    }

    #[must_use]
    pub fn with_parse_simple_lists(mut self, parse: bool) -> Self {
        self.parse_simple_lists = parse;
        self
    }

    #[must_use]
    pub fn with_join_simple_lists(mut self, join: bool) -> Self {
        self.join_simple_lists = join;
        self
    }

    /// Sets the simple list separator and whether lists end with it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::NormalizationPolicy;
    ///
    /// let policy = NormalizationPolicy::new().with_simple_list_separator(",", true);
    /// assert_eq!(policy.simple_list_separator, ",");
    /// assert!(policy.simple_list_final_separator);
    /// ```
    #[must_use]
    pub fn with_simple_list_separator(mut self, separator: &str, final_separator: bool) -> Self {
        self.simple_list_separator = separator.to_string();
        self.simple_list_final_separator = final_separator;
        self
    }

    #[must_use]
    pub fn with_simple_types(mut self, kinds: &[Kind]) -> Self {
        self.simple_types = kinds.to_vec();
        self
    }

    /// Serializes subtrees found at depth `level` through the codec `format`.
    #[must_use]
    pub fn with_max_level(mut self, level: usize, format: &str) -> Self {
        self.max_level = Some(level);
        self.max_level_format = format.to_string();
        self
    }

    /// Returns `true` if values of `kind` count as simple list items.
    ///
    /// Big integers count as integers.
    #[must_use]
    pub fn is_simple(&self, kind: Kind) -> bool {
        let kind = match kind {
            Kind::BigInt => Kind::Integer,
            other => other,
        };
        self.simple_types.contains(&kind)
    }

    /// Lists the options that differ from the default, as `(name, value)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::NormalizationPolicy;
    ///
    /// assert!(NormalizationPolicy::new().configured_options().is_empty());
    ///
    /// let policy = NormalizationPolicy::new().with_max_level(1, "yaml");
    /// assert_eq!(
    ///     policy.configured_options(),
    ///     vec![("max_level", "1".to_string()), ("max_level_format", "\"yaml\"".to_string())]
    /// );
    /// ```
    #[must_use]
    pub fn configured_options(&self) -> Vec<(&'static str, String)> {
        let default = Self::default();
        let mut options = Vec::new();

        macro_rules! changed {
            ($field:ident, $render:expr) => {
                if self.$field != default.$field {
                    options.push((stringify!($field), $render(&self.$field)));
                }
            };
        }

        let flag = |b: &bool| b.to_string();
        let quoted = |s: &String| format!("{:?}", s);

        changed!(allow_date, flag);
        changed!(parse_date, flag);
        changed!(parse_str, flag);
        changed!(special_tokens, |tokens: &IndexMap<String, Value>| {
            let entries: Vec<String> = tokens
                .iter()
                .map(|(token, value)| format!("{:?}: {}", token, value))
                .collect();
            format!("{{{}}}", entries.join(", "))
        });
        changed!(skip_null_values, flag);
        changed!(skip_null_keys, flag);
        changed!(force_string_keys, flag);
        changed!(parse_simple_lists, flag);
        changed!(join_simple_lists, flag);
        changed!(simple_list_separator, quoted);
        changed!(simple_list_final_separator, flag);
        changed!(simple_types, |kinds: &Vec<Kind>| {
            let names: Vec<&str> = kinds.iter().map(Kind::as_str).collect();
            format!("[{}]", names.join(", "))
        });
        changed!(max_level, |level: &Option<usize>| match level {
            Some(level) => level.to_string(),
            None => "none".to_string(),
        });
        changed!(max_level_format, quoted);

        options
    }
}

impl fmt::Display for NormalizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = self.configured_options();
        if options.is_empty() {
            return f.write_str("default conversion");
        }
        let rendered: Vec<String> = options
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        f.write_str(&rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_display() {
        assert_eq!(NormalizationPolicy::default().to_string(), "default conversion");
    }

    #[test]
    fn test_special_tokens_display() {
        let policy = NormalizationPolicy::new().with_special_tokens([("ja", Value::Bool(true))]);
        assert_eq!(policy.to_string(), "special_tokens={\"ja\": true}");
    }

    #[test]
    fn test_simple_types_display() {
        let policy = NormalizationPolicy::new().with_simple_types(&[Kind::Text, Kind::Date]);
        assert_eq!(policy.to_string(), "simple_types=[text, date]");
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: NormalizationPolicy = toml::from_str(
            r#"
            join_simple_lists = true
            simple_list_separator = ","
            simple_types = ["text", "integer"]
            "#,
        )
        .unwrap();
        assert!(policy.join_simple_lists);
        assert_eq!(policy.simple_list_separator, ",");
        assert!(policy.is_simple(Kind::Integer));
        assert!(policy.is_simple(Kind::BigInt));
        assert!(!policy.is_simple(Kind::Bool));
        assert_eq!(policy.special_tokens, default_special_tokens());
    }
}
