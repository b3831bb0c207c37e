//! INI files, parsed and written by hand.
//!
//! The format has two levels: root keys, then `[section]` blocks of
//! `key = value` lines. Every value is text. The bound policies make up
//! for the rest: on the way out lists of simple leaves are joined with
//! `;` and anything nested deeper is embedded as JSON; on the way in text
//! is parsed back into tokens, numbers, lists and JSON subtrees.
//!
//! ```ini
//! name = demo
//!
//! [server]
//! port = 8080
//! hosts = a.example;b.example;
//! limits = {"rps":100}
//! ```
//!
//! Lines starting with `;` or `#` are comments. An indented line continues
//! the previous value on a new line.
//!
//! Root keys sit one level above the policies' JSON depth, so a root list
//! that cannot be joined is written as JSON text by the codec itself and
//! read back the same way.

use super::JsonCodec;
use crate::codec::{unwrap_root, wrap_root, CodecSubtree};
use crate::normalize::SubtreeSerializer;
use crate::{Codec, CodecDescriptor, Error, Input, Mapping, NormalizationPolicy, Result, Value};
use std::sync::Arc;
use tracing::{trace, warn};

const ID: &str = "ini";

const CONTINUATION_INDENT: &str = "    ";

pub struct IniCodec {
    descriptor: CodecDescriptor,
    json: CodecSubtree,
}

impl Default for IniCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl IniCodec {
    #[must_use]
    pub fn new() -> Self {
        IniCodec {
            descriptor: CodecDescriptor::new(ID, "INI")
                .with_extensions(&[".ini", ".cfg"])
                .with_pre_encode(
                    NormalizationPolicy::new()
                        .with_force_string_keys(true)
                        .with_skip_null_values(true)
                        .with_join_simple_lists(true)
                        .with_simple_list_separator(";", true)
                        .with_max_level(2, "json"),
                )
                .with_post_decode(
                    NormalizationPolicy::new()
                        .with_force_string_keys(true)
                        .with_parse_str(true)
                        .with_parse_simple_lists(true)
                        .with_simple_list_separator(";", true)
                        .with_max_level(2, "json"),
                ),
            json: CodecSubtree::new(Arc::new(JsonCodec::new())),
        }
    }

    /// A list the pre-encode policy will not join.
    fn is_nested_list(&self, value: &Value) -> bool {
        let Value::Sequence(items) = value else {
            return false;
        };
        let simple = |item: &Value| {
            let kind = item.kind();
            kind.is_leaf()
                && self
                    .descriptor
                    .pre_encode
                    .as_ref()
                    .map_or(true, |policy| policy.is_simple(kind))
        };
        !items.iter().all(simple)
    }

    fn list_to_json(&self, value: &Value) -> Option<Value> {
        match self.json.serialize_subtree(value) {
            Ok(text) => Some(Value::Text(text)),
            Err(err) => {
                warn!(error = %err, "cannot embed root list as JSON");
                None
            }
        }
    }

    fn json_to_list(&self, text: &str) -> Option<Value> {
        if !text.starts_with('[') {
            return None;
        }
        match self.json.deserialize_subtree(text) {
            Ok(list @ Value::Sequence(_)) => {
                trace!("re-parsed root list");
                Some(list)
            }
            _ => None,
        }
    }
}

/// Where parsed `key = value` lines go.
enum Target {
    Root,
    Section(usize),
}

struct Parser {
    root: Mapping,
    sections: Vec<(String, Mapping)>,
    target: Target,
    /// Last key written, for continuation lines.
    open_key: bool,
}

impl Parser {
    fn current(&mut self) -> &mut Mapping {
        match self.target {
            Target::Root => &mut self.root,
            Target::Section(i) => &mut self.sections[i].1,
        }
    }

    fn parse_line(&mut self, number: usize, raw: &str) -> Result<()> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            return Ok(());
        }

        let indented = raw.starts_with(char::is_whitespace);
        if indented && self.open_key {
            return self.continue_value(line);
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| Error::decode(ID, format!("line {}: malformed section header", number)))?;
            self.sections.push((name.to_string(), Mapping::new()));
            self.target = Target::Section(self.sections.len() - 1);
            self.open_key = false;
            return Ok(());
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| Error::decode(ID, format!("line {}: expected `key = value`", number)))?;
        let key = key.trim();
        if !valid_key(key) {
            return Err(Error::decode(ID, format!("line {}: invalid key {:?}", number, key)));
        }
        self.current().push(key, Value::from(value.trim()));
        self.open_key = true;
        Ok(())
    }

    fn continue_value(&mut self, line: &str) -> Result<()> {
        let map = self.current();
        match map.last_mut() {
            Some(Value::Text(text)) => {
                text.push('\n');
                text.push_str(line);
                Ok(())
            }
            _ => Err(Error::decode(ID, "continuation line without a value")),
        }
    }

    fn finish(self) -> Value {
        let mut root = self.root;
        for (name, section) in self.sections {
            root.push(name, Value::Mapping(section));
        }
        Value::Mapping(root)
    }
}

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with(['[', '{', '"', '\'', '-'])
        && !key.contains(['\n', '='])
        && !key.contains(": ")
}

impl Codec for IniCodec {
    fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    fn before_encode(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Mapping(map) => {
                if !map.iter().any(|(_, item)| self.is_nested_list(item)) {
                    return None;
                }
                let mut out = Mapping::with_capacity(map.len());
                for (key, item) in map {
                    let item = if self.is_nested_list(item) {
                        self.list_to_json(item).unwrap_or_else(|| item.clone())
                    } else {
                        item.clone()
                    };
                    out.push(key.clone(), item);
                }
                Some(Value::Mapping(out))
            }
            list if self.is_nested_list(list) => self.list_to_json(list),
            _ => None,
        }
    }

    fn after_decode(&self, value: Value) -> Value {
        match value {
            Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(key, item)| {
                        let list = item.as_str().and_then(|text| self.json_to_list(text));
                        (key, list.unwrap_or(item))
                    })
                    .collect(),
            ),
            Value::Text(text) => self.json_to_list(&text).unwrap_or(Value::Text(text)),
            other => other,
        }
    }

    fn decode(&self, input: &mut Input<'_>) -> Result<Value> {
        let text = input.take_str(ID)?;
        let mut parser = Parser {
            root: Mapping::new(),
            sections: Vec::new(),
            target: Target::Root,
            open_key: false,
        };
        for (i, line) in text.lines().enumerate() {
            parser.parse_line(i + 1, line)?;
        }
        Ok(unwrap_root(parser.finish()))
    }

    fn encode(&self, value: &Value, pretty: bool) -> Result<Vec<u8>> {
        let root = wrap_root(value);
        let map = root
            .as_mapping()
            .ok_or_else(|| Error::encode(ID, "document root must be a mapping"))?;

        let mut out = String::new();
        let mut sections = Vec::new();
        for (key, item) in map {
            match item {
                Value::Mapping(section) => sections.push((key, section)),
                _ => write_entry(&mut out, key, item, pretty)?,
            }
        }
        for (name, section) in sections {
            let name = name.to_text();
            if name.is_empty() || name.contains([']', '\n']) {
                return Err(Error::encode(ID, format!("invalid section name {:?}", name)));
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", name));
            for (key, item) in section {
                write_entry(&mut out, key, item, pretty)?;
            }
        }
        Ok(out.into_bytes())
    }
}

fn write_entry(out: &mut String, key: &Value, value: &Value, pretty: bool) -> Result<()> {
    let key = key.to_text();
    if !valid_key(&key) {
        return Err(Error::encode(ID, format!("invalid key {:?}", key)));
    }
    let text = match value {
        Value::Null => return Err(Error::encode(ID, format!("{} is null", key))),
        Value::Sequence(_) | Value::Mapping(_) => {
            return Err(Error::encode(
                ID,
                format!("{} holds a {}, which INI cannot nest", key, value.kind()),
            ))
        }
        other => other.to_text(),
    };
    let separator = if pretty { " = " } else { "=" };
    let mut lines = text.lines();
    out.push_str(&format!("{}{}{}", key, separator, lines.next().unwrap_or("")));
    for line in lines {
        out.push('\n');
        out.push_str(CONTINUATION_INDENT);
        out.push_str(line);
    }
    out.push('\n');
    Ok(())
}
