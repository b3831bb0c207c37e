//! JSONPath queries over value trees.
//!
//! Supported syntax, a subset of RFC 9535 without filters:
//!
//! | expression       | selects                                    |
//! |------------------|--------------------------------------------|
//! | `$`              | the root (optional at the start)           |
//! | `.name`          | mapping entry `name`                       |
//! | `['name']`       | same, for names with special characters    |
//! | `[2]`, `[-1]`    | sequence element, negative counts from end |
//! | `[1:3]`, `[::2]` | sequence slice `start:end:step`            |
//! | `.*`, `[*]`      | every child                                |
//! | `..name`, `..*`  | recursive descent                          |
//! | `[0, 'a']`       | union of selectors                         |
//!
//! A query with exactly one match yields that value; any other number of
//! matches yields a sequence of them.
//!
//! ```rust
//! use config_formats::{query, value};
//!
//! let doc = value!({"servers": [{"name": "a"}, {"name": "b"}]});
//! assert_eq!(query("$.servers[0].name", &doc).unwrap(), value!("a"));
//! assert_eq!(query("$..name", &doc).unwrap(), value!(["a", "b"]));
//! ```

use crate::{Error, Result, Value};
use std::str::FromStr;

/// A single selection step inside a segment.
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    Name(String),
    Index(i64),
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Wildcard,
}

/// One `.x`, `[..]` or `..x` step of a query.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSegment {
    pub selectors: Vec<Selector>,
    /// Applies to the node and all its descendants.
    pub recursive: bool,
}

/// A parsed query expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    segments: Vec<PathSegment>,
}

impl Query {
    /// Parses a query expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] pointing at the offending position.
    pub fn parse(path: &str) -> Result<Self> {
        Parser { path, pos: 0 }.parse()
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns every node matched by this query, in document order.
    #[must_use]
    pub fn select<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut nodes = vec![root];
        for segment in &self.segments {
            let mut next = Vec::new();
            for node in nodes {
                if segment.recursive {
                    descend(node, &segment.selectors, &mut next);
                } else {
                    apply(node, &segment.selectors, &mut next);
                }
            }
            nodes = next;
        }
        nodes
    }
}

impl FromStr for Query {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Evaluates `path` against `value`.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] if `path` does not parse.
pub fn query(path: &str, value: &Value) -> Result<Value> {
    let matches = Query::parse(path)?.select(value);
    Ok(match matches.as_slice() {
        [single] => (*single).clone(),
        many => Value::Sequence(many.iter().map(|v| (*v).clone()).collect()),
    })
}

fn apply<'a>(node: &'a Value, selectors: &[Selector], out: &mut Vec<&'a Value>) {
    for selector in selectors {
        select_one(node, selector, out);
    }
}

fn descend<'a>(node: &'a Value, selectors: &[Selector], out: &mut Vec<&'a Value>) {
    apply(node, selectors, out);
    match node {
        Value::Mapping(map) => {
            for child in map.values() {
                descend(child, selectors, out);
            }
        }
        Value::Sequence(items) => {
            for child in items {
                descend(child, selectors, out);
            }
        }
        _ => {}
    }
}

fn select_one<'a>(node: &'a Value, selector: &Selector, out: &mut Vec<&'a Value>) {
    match (selector, node) {
        (Selector::Name(name), Value::Mapping(map)) => {
            if let Some((_, child)) = map.iter().rev().find(|(k, _)| k.to_text() == *name) {
                out.push(child);
            }
        }
        (Selector::Index(index), Value::Sequence(items)) => {
            let position = if *index < 0 {
                items.len().checked_sub(index.unsigned_abs() as usize)
            } else {
                Some(*index as usize)
            };
            if let Some(child) = position.and_then(|i| items.get(i)) {
                out.push(child);
            }
        }
        (Selector::Slice { start, end, step }, Value::Sequence(items)) => {
            slice(items, *start, *end, step.unwrap_or(1), out);
        }
        (Selector::Wildcard, Value::Mapping(map)) => out.extend(map.values()),
        (Selector::Wildcard, Value::Sequence(items)) => out.extend(items.iter()),
        _ => {}
    }
}

fn slice<'a>(
    items: &'a [Value],
    start: Option<i64>,
    end: Option<i64>,
    step: i64,
    out: &mut Vec<&'a Value>,
) {
    let len = items.len() as i64;
    let resolve = |i: i64| if i < 0 { len + i } else { i };
    if step > 0 {
        let lower = resolve(start.unwrap_or(0)).clamp(0, len);
        let upper = resolve(end.unwrap_or(len)).clamp(0, len);
        let mut i = lower;
        while i < upper {
            out.push(&items[i as usize]);
            i += step;
        }
    } else if step < 0 {
        let upper = start.map_or(len - 1, resolve).clamp(-1, len - 1);
        let lower = end.map_or(-1, resolve).clamp(-1, len - 1);
        let mut i = upper;
        while i > lower {
            out.push(&items[i as usize]);
            i += step;
        }
    }
}

struct Parser<'p> {
    path: &'p str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, msg: &str) -> Error {
        Error::invalid_path(self.path, self.pos, msg)
    }

    fn peek(&self) -> Option<char> {
        self.path[self.pos..].chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn parse(mut self) -> Result<Query> {
        let mut segments = Vec::new();
        self.skip_whitespace();
        if !self.eat('$') && self.peek().map_or(false, is_name_char) {
            segments.push(PathSegment {
                selectors: vec![Selector::Name(self.name()?)],
                recursive: false,
            });
        }
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else { break };
            let segment = match c {
                '.' => {
                    self.pos += 1;
                    let recursive = self.eat('.');
                    let selectors = if self.eat('*') {
                        vec![Selector::Wildcard]
                    } else if recursive && self.peek() == Some('[') {
                        self.bracket()?
                    } else {
                        vec![Selector::Name(self.name()?)]
                    };
                    PathSegment { selectors, recursive }
                }
                '[' => PathSegment {
                    selectors: self.bracket()?,
                    recursive: false,
                },
                _ => return Err(self.error("expected `.` or `[`")),
            };
            segments.push(segment);
        }
        Ok(Query { segments })
    }

    fn name(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error("expected a name"));
        }
        Ok(self.path[start..self.pos].to_string())
    }

    fn bracket(&mut self) -> Result<Vec<Selector>> {
        self.eat('[');
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.selector()?);
            self.skip_whitespace();
            if self.eat(']') {
                return Ok(selectors);
            }
            if !self.eat(',') {
                return Err(self.error("expected `,` or `]`"));
            }
        }
    }

    fn selector(&mut self) -> Result<Selector> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok(Selector::Wildcard)
            }
            Some(quote @ ('\'' | '"')) => {
                self.pos += 1;
                Ok(Selector::Name(self.quoted(quote)?))
            }
            Some(c) if c == '-' || c == ':' || c.is_ascii_digit() => {
                let start = self.integer()?;
                self.skip_whitespace();
                if !self.eat(':') {
                    return start
                        .map(Selector::Index)
                        .ok_or_else(|| self.error("expected an index"));
                }
                self.skip_whitespace();
                let end = self.integer()?;
                self.skip_whitespace();
                let step = if self.eat(':') {
                    self.skip_whitespace();
                    self.integer()?
                } else {
                    None
                };
                Ok(Selector::Slice { start, end, step })
            }
            _ => Err(self.error("expected a selector")),
        }
    }

    fn integer(&mut self) -> Result<Option<i64>> {
        let start = self.pos;
        self.eat('-');
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = &self.path[start..self.pos];
        if digits.is_empty() {
            return Ok(None);
        }
        digits
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_path(self.path, start, "invalid integer"))
    }

    /// Reads a quoted name; the opening quote is already consumed.
    fn quoted(&mut self, quote: char) -> Result<String> {
        let mut name = String::new();
        let mut chars = self.path[self.pos..].char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => name.push(escaped),
                    None => break,
                },
                c if c == quote => {
                    self.pos += offset + c.len_utf8();
                    return Ok(name);
                }
                c => name.push(c),
            }
        }
        Err(self.error("unterminated quoted name"))
    }
}

fn is_name_char(c: char) -> bool {
    !matches!(c, '.' | '[' | ']' | '$' | '*' | ',' | '\'' | '"') && !c.is_whitespace()
}
