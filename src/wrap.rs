//! Nesting a value under a dotted key path.
//!
//! The path syntax is the one TOML uses for table headers: segments
//! separated by `.`, where a segment may be quoted to contain dots. Double
//! quotes allow backslash escapes; single quotes are literal.
//!
//! ```rust
//! use config_formats::{value, wrap};
//!
//! let wrapped = wrap(r#"tool."my.app""#, value!({"port": 80})).unwrap();
//! assert_eq!(wrapped, value!({"tool": {"my.app": {"port": 80}}}));
//! ```

use crate::{Error, Mapping, Result, Value};

/// Splits a dotted key path into its segments.
///
/// Whitespace around segments is ignored. An empty path has no segments.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] for empty segments, unterminated quotes
/// or text after a closing quote.
pub fn split_path(path: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    if path.trim().is_empty() {
        return Ok(segments);
    }

    let mut chars = path.char_indices().peekable();
    loop {
        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        let start = chars.peek().map_or(path.len(), |(i, _)| *i);

        let segment = match chars.peek().map(|(_, c)| *c) {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                let mut segment = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' if quote == '"' => {
                            if let Some((_, escaped)) = chars.next() {
                                segment.push(escaped);
                            }
                        }
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        c => segment.push(c),
                    }
                }
                if !closed {
                    return Err(Error::invalid_path(path, start, "unterminated quote"));
                }
                segment
            }
            _ => {
                let mut segment = String::new();
                while let Some((_, c)) = chars.next_if(|(_, c)| *c != '.') {
                    segment.push(c);
                }
                let segment = segment.trim_end().to_string();
                if segment.is_empty() {
                    return Err(Error::invalid_path(path, start, "empty segment"));
                }
                if segment.contains(['"', '\'']) {
                    return Err(Error::invalid_path(path, start, "quote inside bare segment"));
                }
                segment
            }
        };
        segments.push(segment);

        while chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
        match chars.next() {
            None => return Ok(segments),
            Some((_, '.')) => {}
            Some((at, _)) => return Err(Error::invalid_path(path, at, "expected `.`")),
        }
    }
}

/// Nests `value` under the mappings named by `path`, innermost last.
///
/// An empty path returns `value` unchanged.
///
/// # Errors
///
/// See [`split_path`].
pub fn wrap(path: &str, value: Value) -> Result<Value> {
    let segments = split_path(path)?;
    Ok(segments.into_iter().rev().fold(value, |inner, key| {
        let mut map = Mapping::with_capacity(1);
        map.insert(key, inner);
        Value::Mapping(map)
    }))
}
