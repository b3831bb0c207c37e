//! Ordered mapping type for decoded objects, tables and sections.
//!
//! [`Mapping`] keeps entries as an ordered list of `(Value, Value)` pairs.
//! Keys are full values because formats such as YAML and MessagePack allow
//! non-string keys, and because floats cannot be hashed, an `IndexMap` cannot
//! hold them.
//!
//! Decoders append with [`Mapping::push`], which keeps duplicate keys as
//! they appear in the input. [`Mapping::insert`] is last-write-wins: a
//! repeated key keeps the position of its first occurrence and takes the
//! newest value. The normalization engine builds its output with `insert`,
//! which is how normalized mappings end up with unique keys.
//!
//! ## Examples
//!
//! ```rust
//! use config_formats::{Mapping, Value};
//!
//! let mut map = Mapping::new();
//! map.insert("name", Value::from("Alice"));
//! map.insert("age", Value::from(30));
//! map.insert("name", Value::from("Bob"));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Bob"));
//! ```

use crate::Value;

/// An ordered list of key-value pairs.
///
/// # Examples
///
/// ```rust
/// use config_formats::{Mapping, Value};
///
/// let mut map = Mapping::new();
/// map.insert("first", Value::from(1));
/// map.insert("second", Value::from(2));
///
/// // Iteration maintains insertion order
/// let keys: Vec<_> = map.keys().filter_map(Value::as_str).collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping(Vec<(Value, Value)>);

impl Mapping {
    /// Creates an empty `Mapping`.
    #[must_use]
    pub fn new() -> Self {
        Mapping(Vec::new())
    }

    /// Creates an empty `Mapping` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Mapping(Vec::with_capacity(capacity))
    }

    /// Inserts a key-value pair, replacing the value of an equal key in place.
    ///
    /// If the map already contained this key, the old value is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::{Mapping, Value};
    ///
    /// let mut map = Mapping::new();
    /// assert!(map.insert("key", Value::from(42)).is_none());
    /// assert_eq!(map.insert("key", Value::from(43)), Some(Value::from(42)));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: impl Into<Value>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    /// Appends a key-value pair without checking for an existing key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::{Mapping, Value};
    ///
    /// let mut map = Mapping::new();
    /// map.push("key", Value::from(1));
    /// map.push("key", Value::from(2));
    /// assert_eq!(map.len(), 2);
    /// // lookups see the last entry
    /// assert_eq!(map.get("key"), Some(&Value::from(2)));
    /// ```
    pub fn push(&mut self, key: impl Into<Value>, value: Value) {
        self.0.push((key.into(), value));
    }

    /// Returns the value of the last entry whose key is the text `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Returns the value of the last entry whose key equals `key`.
    #[must_use]
    pub fn get_value(&self, key: &Value) -> Option<&Value> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns the value of the most recently added entry.
    pub fn last_mut(&mut self) -> Option<&mut Value> {
        self.0.last_mut().map(|(_, v)| v)
    }

    /// Returns `true` if some entry has the text key `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the values, in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    /// Returns an iterator over the key-value pairs, in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.0.iter()
    }
}

impl IntoIterator for Mapping {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = &'a (Value, Value);
    type IntoIter = std::slice::Iter<'a, (Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Collects with [`Mapping::push`]; duplicates are kept.
impl<K: Into<Value>> FromIterator<(K, Value)> for Mapping {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Mapping(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
