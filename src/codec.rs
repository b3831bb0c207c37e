//! The contract every format plugin implements.
//!
//! A [`Codec`] turns bytes into a [`Value`] and back. Its
//! [`CodecDescriptor`] carries the static metadata the registry needs:
//! identifier, label, file extensions, whether output is binary, and the
//! normalization policies bound to the format. Bound policies are how
//! format quirks ("TOML has no null", "INI cannot nest") are declared once
//! instead of at every call site; the [`Registry`](crate::Registry) applies
//! them around `decode` and `encode`.
//!
//! ## Implementing a codec
//!
//! ```rust
//! use config_formats::{Codec, CodecDescriptor, Error, Input, Result, Value};
//!
//! /// One text line per document.
//! struct Line {
//!     descriptor: CodecDescriptor,
//! }
//!
//! impl Codec for Line {
//!     fn descriptor(&self) -> &CodecDescriptor {
//!         &self.descriptor
//!     }
//!
//!     fn decode(&self, input: &mut Input<'_>) -> Result<Value> {
//!         let text = input.take_str("line")?;
//!         Ok(Value::from(text.trim_end_matches('\n')))
//!     }
//!
//!     fn encode(&self, value: &Value, _pretty: bool) -> Result<Vec<u8>> {
//!         match value {
//!             Value::Text(s) if !s.contains('\n') => Ok(format!("{}\n", s).into_bytes()),
//!             other => Err(Error::encode("line", format!("cannot write {}", other.kind()))),
//!         }
//!     }
//! }
//!
//! let line = Line { descriptor: CodecDescriptor::new("line", "Line").with_extensions(&[".line"]) };
//! assert_eq!(line.decode_slice(b"hello\n", true).unwrap(), Value::from("hello"));
//! ```

use crate::input::check_remainder;
use crate::normalize::SubtreeSerializer;
use crate::{Error, Input, NormalizationPolicy, Normalizer, Result, Value};
use std::sync::Arc;

/// Sentinel key under which table-only formats store a non-mapping root.
pub const DEFAULT_KEY: &str = "DEFAULT";

/// Static description of a codec.
#[derive(Clone, Debug)]
pub struct CodecDescriptor {
    /// Unique identifier, e.g. `json`.
    pub id: &'static str,
    /// Human-readable name, e.g. `JSON`.
    pub label: &'static str,
    /// Recognized file extensions, with leading dot.
    pub extensions: &'static [&'static str],
    /// Output is binary rather than UTF-8 text.
    pub binary: bool,
    /// Applied to values before `encode`.
    pub pre_encode: Option<NormalizationPolicy>,
    /// Applied to values after `decode`.
    pub post_decode: Option<NormalizationPolicy>,
}

impl CodecDescriptor {
    /// A text codec without extensions or bound policies.
    #[must_use]
    pub const fn new(id: &'static str, label: &'static str) -> Self {
        CodecDescriptor {
            id,
            label,
            extensions: &[],
            binary: false,
            pre_encode: None,
            post_decode: None,
        }
    }

    #[must_use]
    pub const fn with_extensions(mut self, extensions: &'static [&'static str]) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub const fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    #[must_use]
    pub fn with_pre_encode(mut self, policy: NormalizationPolicy) -> Self {
        self.pre_encode = Some(policy);
        self
    }

    #[must_use]
    pub fn with_post_decode(mut self, policy: NormalizationPolicy) -> Self {
        self.post_decode = Some(policy);
        self
    }

    /// Returns `true` if `extension` (with or without leading dot, any case)
    /// is one of this codec's extensions.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::CodecDescriptor;
    ///
    /// let yaml = CodecDescriptor::new("yaml", "YAML").with_extensions(&[".yaml", ".yml"]);
    /// assert!(yaml.matches_extension("yml"));
    /// assert!(yaml.matches_extension(".YAML"));
    /// assert!(!yaml.matches_extension("json"));
    /// ```
    #[must_use]
    pub fn matches_extension(&self, extension: &str) -> bool {
        let wanted = extension.trim_start_matches('.');
        self.extensions
            .iter()
            .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(wanted))
    }
}

/// A format plugin.
///
/// Implementations must be stateless with respect to individual
/// conversions; the registry shares one instance across threads.
pub trait Codec: Send + Sync {
    /// Static metadata of this codec.
    fn descriptor(&self) -> &CodecDescriptor;

    /// Decodes one document from `input`, advancing past what was parsed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for malformed input.
    fn decode(&self, input: &mut Input<'_>) -> Result<Value>;

    /// Encodes `value`, optionally in a more readable layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if `value` has a shape the format cannot
    /// represent.
    fn encode(&self, value: &Value, pretty: bool) -> Result<Vec<u8>>;

    fn id(&self) -> &'static str {
        self.descriptor().id
    }

    fn label(&self) -> &'static str {
        self.descriptor().label
    }

    /// Rejects input that decodes but is better read by another codec.
    /// Only auto-detection calls this.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when detection should move on.
    fn check_detectable(&self, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }

    /// Reshapes a value before the pre-encode policy runs, for structure
    /// the policy cannot express. `None` keeps the value as it is.
    fn before_encode(&self, _value: &Value) -> Option<Value> {
        None
    }

    /// Undoes [`before_encode`](Self::before_encode) once the post-decode
    /// policy has run.
    fn after_decode(&self, value: Value) -> Value {
        value
    }

    /// Decodes a whole byte slice. With `strict`, bytes left after the
    /// document are an [`Error::RemainingData`].
    fn decode_slice(&self, bytes: &[u8], strict: bool) -> Result<Value> {
        let mut input = Input::new(bytes);
        let value = self.decode(&mut input)?;
        if strict {
            check_remainder(&mut input, self.id())?;
        }
        Ok(value)
    }
}

/// Exposes a codec as the engine's [`SubtreeSerializer`].
///
/// The codec's own bound policies are applied, but without a nested
/// subtree serializer: a `max_level` inside those policies falls back to
/// plain text.
pub struct CodecSubtree {
    codec: Arc<dyn Codec>,
}

impl CodecSubtree {
    #[must_use]
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        CodecSubtree { codec }
    }
}

impl SubtreeSerializer for CodecSubtree {
    fn serialize_subtree(&self, value: &Value) -> Result<String> {
        let descriptor = self.codec.descriptor();
        if descriptor.binary {
            return Err(Error::encode(
                descriptor.id,
                "binary output cannot be embedded as text",
            ));
        }
        let reshaped = self.codec.before_encode(value);
        let value = reshaped.as_ref().unwrap_or(value);
        let prepared = match &descriptor.pre_encode {
            Some(policy) => Normalizer::new(policy.clone()).normalize(value),
            None => value.clone(),
        };
        let bytes = self.codec.encode(&prepared, false)?;
        let text = String::from_utf8(bytes).map_err(|e| Error::encode(descriptor.id, e))?;
        Ok(text.trim_end_matches('\n').to_string())
    }

    fn deserialize_subtree(&self, text: &str) -> Result<Value> {
        let descriptor = self.codec.descriptor();
        let value = self.codec.decode_slice(text.as_bytes(), true)?;
        let value = match &descriptor.post_decode {
            Some(policy) => Normalizer::new(policy.clone()).normalize(&value),
            None => value,
        };
        Ok(self.codec.after_decode(value))
    }
}

/// Wraps a non-mapping root under [`DEFAULT_KEY`] for table-only formats.
pub(crate) fn wrap_root(value: &Value) -> std::borrow::Cow<'_, Value> {
    use std::borrow::Cow;
    match value {
        Value::Mapping(_) => Cow::Borrowed(value),
        other => {
            let mut root = crate::Mapping::new();
            root.insert(DEFAULT_KEY, other.clone());
            Cow::Owned(Value::Mapping(root))
        }
    }
}

/// Reverses [`wrap_root`]: a mapping whose only key is [`DEFAULT_KEY`]
/// yields that key's value.
pub(crate) fn unwrap_root(value: Value) -> Value {
    match value {
        Value::Mapping(map) if map.len() == 1 && map.contains_key(DEFAULT_KEY) => map
            .into_iter()
            .next()
            .map(|(_, inner)| inner)
            .unwrap_or(Value::Null),
        other => other,
    }
}
