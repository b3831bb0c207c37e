//! The set of known codecs.
//!
//! A [`Registry`] maps codec identifiers to [`Codec`] instances, in
//! registration order. That order is also the auto-detection order, see
//! [`Registry::detect`].
//!
//! Most callers use the process-wide registry returned by [`global`], which
//! holds the built-in codecs: `json`, `toml`, `msgpack`, `ini` and `yaml`.
//! Build a [`Registry`] yourself to change the order or add formats.
//!
//! ```rust
//! use config_formats::registry;
//!
//! let ids: Vec<&str> = registry::global().iter().map(|c| c.id()).collect();
//! assert_eq!(ids, ["json", "toml", "msgpack", "ini", "yaml"]);
//! ```

use crate::codec::CodecSubtree;
use crate::{formats, Codec, Error, NormalizationPolicy, Normalizer, Result, Value};
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// Codec used when neither a format nor a recognizable extension is given.
pub const DEFAULT_FORMAT: &str = "json";

/// An ordered collection of codecs.
#[derive(Clone, Default)]
pub struct Registry {
    codecs: IndexMap<&'static str, Arc<dyn Codec>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.codecs.keys()).finish()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in codecs in detection order.
    #[must_use]
    pub fn with_builtin_codecs() -> Self {
        let mut registry = Self::new();
        for codec in formats::builtin() {
            registry.codecs.insert(codec.id(), codec);
        }
        registry
    }

    /// Adds a codec after the existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFormat`] if the identifier is taken.
    pub fn register(&mut self, codec: Arc<dyn Codec>) -> Result<()> {
        let id = codec.id();
        if self.codecs.contains_key(id) {
            return Err(Error::DuplicateFormat(id.to_string()));
        }
        debug!(format = id, "registered codec");
        self.codecs.insert(id, codec);
        Ok(())
    }

    /// Looks up a codec by identifier.
    pub fn get(&self, id: &str) -> Result<&Arc<dyn Codec>> {
        self.codecs
            .get(id)
            .ok_or_else(|| Error::UnknownFormat(id.to_string()))
    }

    /// Looks up a codec by file extension. The first registered match wins.
    pub fn by_extension(&self, extension: &str) -> Result<&Arc<dyn Codec>> {
        self.codecs
            .values()
            .find(|codec| codec.descriptor().matches_extension(extension))
            .ok_or_else(|| Error::UnknownFormat(extension.to_string()))
    }

    /// Looks up a codec by identifier, then by extension.
    ///
    /// ```rust
    /// use config_formats::registry;
    ///
    /// assert_eq!(registry::global().resolve("yml").unwrap().id(), "yaml");
    /// assert!(registry::global().resolve("xml").is_err());
    /// ```
    pub fn resolve(&self, name: &str) -> Result<&Arc<dyn Codec>> {
        self.get(name).or_else(|_| self.by_extension(name))
    }

    /// Looks up the codec for a path's extension.
    pub fn for_path(&self, path: &Path) -> Result<&Arc<dyn Codec>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
        self.by_extension(extension)
    }

    /// Iterates codecs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Codec>> {
        self.codecs.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Builds a [`Normalizer`] whose `max_level` subtrees go through the
    /// codec named by the policy's `max_level_format`.
    ///
    /// ```rust
    /// use config_formats::{registry, value, NormalizationPolicy};
    ///
    /// let normalizer = registry::global()
    ///     .normalizer(NormalizationPolicy::new().with_max_level(1, "json"));
    /// assert_eq!(
    ///     normalizer.normalize(&value!({"a": {"b": [1, 2]}})),
    ///     value!({"a": "{\"b\":[1,2]}"})
    /// );
    /// ```
    #[must_use]
    pub fn normalizer(&self, policy: NormalizationPolicy) -> Normalizer {
        if policy.max_level.is_none() {
            return Normalizer::new(policy);
        }
        let subtree = match self.get(&policy.max_level_format) {
            Ok(codec) => Some(Arc::new(CodecSubtree::new(Arc::clone(codec)))),
            Err(err) => {
                warn!(error = %err, "max level format is not registered");
                None
            }
        };
        let normalizer = Normalizer::new(policy);
        match subtree {
            Some(subtree) => normalizer.with_subtree_serializer(subtree),
            None => normalizer,
        }
    }

    /// Applies a codec's post-decode policy, if it has one, then its
    /// [`after_decode`](Codec::after_decode) step.
    #[must_use]
    pub fn finish_decode(&self, codec: &dyn Codec, value: Value) -> Value {
        let value = match &codec.descriptor().post_decode {
            Some(policy) => self.normalizer(policy.clone()).normalize(&value),
            None => value,
        };
        codec.after_decode(value)
    }

    /// Applies a codec's [`before_encode`](Codec::before_encode) step, then
    /// its pre-encode policy, if it has one.
    #[must_use]
    pub fn prepare_encode(&self, codec: &dyn Codec, value: &Value) -> Value {
        let reshaped = codec.before_encode(value);
        let value = reshaped.as_ref().unwrap_or(value);
        match &codec.descriptor().pre_encode {
            Some(policy) => self.normalizer(policy.clone()).normalize(value),
            None => value.clone(),
        }
    }

    /// Decodes `bytes` with the codec `id` and applies its post-decode
    /// policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`], or whatever the codec reports. With
    /// `strict`, unread bytes are an [`Error::RemainingData`].
    pub fn decode(&self, id: &str, bytes: &[u8], strict: bool) -> Result<Value> {
        let codec = self.resolve(id)?;
        let value = codec.decode_slice(bytes, strict)?;
        Ok(self.finish_decode(codec.as_ref(), value))
    }

    /// Applies the pre-encode policy of codec `id` and encodes `value`.
    ///
    /// ```rust
    /// use config_formats::{registry, value};
    ///
    /// let bytes = registry::global().encode("toml", &value!({"a": null, "b": 1}), false).unwrap();
    /// assert_eq!(String::from_utf8(bytes).unwrap(), "b = 1\n");
    /// ```
    pub fn encode(&self, id: &str, value: &Value, pretty: bool) -> Result<Vec<u8>> {
        let codec = self.resolve(id)?;
        let prepared = self.prepare_encode(codec.as_ref(), value);
        codec.encode(&prepared, pretty)
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Returns the process-wide registry, creating it with the built-in codecs
/// on first use.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::with_builtin_codecs)
}

/// Installs `registry` as the process-wide registry.
///
/// Must run before the first call to [`global`]; afterwards the registry is
/// handed back unchanged.
pub fn install(registry: Registry) -> std::result::Result<(), Registry> {
    GLOBAL.set(registry)
}
