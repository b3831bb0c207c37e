//! Reading, writing and converting documents.
//!
//! These are the host-facing entry points. Sources and destinations are
//! optional paths: `None` means standard input or standard output. Failing
//! to open either is an [`Error::Resource`], which auto-detection never
//! swallows.
//!
//! ## Examples
//!
//! ```rust
//! use config_formats::{convert, Conversion};
//!
//! let ini = b"[server]\nport = 8080\nhosts = a;b;\n";
//! let conversion = Conversion::new().with_query("$.server");
//! let json = convert(ini, None, "json", &conversion).unwrap();
//! assert_eq!(json, br#"{"port":8080,"hosts":["a","b"]}"#);
//! ```

use crate::detect::Detected;
use crate::registry::{self, DEFAULT_FORMAT};
use crate::{query, wrap, Error, NormalizationPolicy, Registry, Result, Value};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::debug;

/// The optional steps between decoding and encoding.
#[derive(Clone, Debug, Default)]
pub struct Conversion {
    /// User policy, applied after the source codec's post-decode policy.
    pub policy: Option<NormalizationPolicy>,
    /// JSONPath expression selecting part of the document.
    pub query: Option<String>,
    /// Dotted path to nest the result under.
    pub prefix: Option<String>,
    pub pretty: bool,
}

impl Conversion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, policy: NormalizationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Applies the user policy, the query and the prefix, in that order.
    pub fn project(&self, registry: &Registry, value: Value) -> Result<Value> {
        let mut value = match &self.policy {
            Some(policy) => {
                debug!(policy = %policy, "applying user policy");
                registry.normalizer(policy.clone()).normalize(&value)
            }
            None => value,
        };
        if let Some(path) = &self.query {
            value = query(path, &value)?;
        }
        if let Some(prefix) = &self.prefix {
            value = wrap(prefix, value)?;
        }
        Ok(value)
    }
}

fn read_source(source: Option<&Path>) -> Result<Vec<u8>> {
    match source {
        Some(path) => fs::read(path).map_err(|e| Error::resource(&path.display().to_string(), e)),
        None => {
            let mut bytes = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut bytes)
                .map_err(|e| Error::resource("stdin", e))?;
            Ok(bytes)
        }
    }
}

impl Registry {
    /// Decodes bytes with the declared format, or detects it when `format`
    /// is `None`. Detection is always strict; declared formats only when
    /// `strict` is set.
    pub fn read_bytes(&self, bytes: &[u8], format: Option<&str>, strict: bool) -> Result<Detected> {
        match format {
            Some(name) => {
                let codec = self.resolve(name)?;
                let value = codec.decode_slice(bytes, strict)?;
                Ok(Detected {
                    value: self.finish_decode(codec.as_ref(), value),
                    codec: std::sync::Arc::clone(codec),
                })
            }
            None => self.detect(bytes),
        }
    }

    /// Reads a document from `source`, or standard input for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resource`] if the source cannot be read, and
    /// decoding errors as in [`read_bytes`](Self::read_bytes).
    pub fn read(&self, source: Option<&Path>, format: Option<&str>, strict: bool) -> Result<Detected> {
        let bytes = read_source(source)?;
        debug!(source = ?source, bytes = bytes.len(), "read input");
        self.read_bytes(&bytes, format, strict)
    }

    /// Writes `value` to `dest`, or standard output for `None`.
    ///
    /// The format is `format` if given, else the destination's extension,
    /// else JSON.
    pub fn write(&self, dest: Option<&Path>, format: Option<&str>, value: &Value, pretty: bool) -> Result<()> {
        let codec = match (format, dest) {
            (Some(name), _) => self.resolve(name)?,
            (None, Some(path)) => self.for_path(path).or_else(|_| self.get(DEFAULT_FORMAT))?,
            (None, None) => self.get(DEFAULT_FORMAT)?,
        };
        let bytes = self.encode(codec.id(), value, pretty)?;
        debug!(format = codec.id(), bytes = bytes.len(), "writing output");
        match dest {
            Some(path) => {
                fs::write(path, &bytes).map_err(|e| Error::resource(&path.display().to_string(), e))
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(&bytes)
                    .and_then(|()| stdout.flush())
                    .map_err(|e| Error::io(&e.to_string()))
            }
        }
    }

    /// Converts `input` from `from` (detected when `None`) to `to`.
    pub fn convert(&self, input: &[u8], from: Option<&str>, to: &str, conversion: &Conversion) -> Result<Vec<u8>> {
        let detected = self.read_bytes(input, from, false)?;
        debug!(from = detected.codec.id(), to, "converting");
        let value = conversion.project(self, detected.value)?;
        self.encode(to, &value, conversion.pretty)
    }
}

/// Reads a document with the global registry.
///
/// Returns the decoded value together with the codec that produced it.
pub fn read(source: Option<&Path>, format: Option<&str>) -> Result<Detected> {
    registry::global().read(source, format, false)
}

/// Writes a document with the global registry.
pub fn write(dest: Option<&Path>, format: Option<&str>, value: &Value, pretty: bool) -> Result<()> {
    registry::global().write(dest, format, value, pretty)
}

/// Converts a document with the global registry.
pub fn convert(input: &[u8], from: Option<&str>, to: &str, conversion: &Conversion) -> Result<Vec<u8>> {
    registry::global().convert(input, from, to, conversion)
}

/// Decodes `text` as `format`, strictly, with its post-decode policy.
///
/// ```rust
/// use config_formats::{from_str, value};
///
/// assert_eq!(from_str("yaml", "a: [1, 2]").unwrap(), value!({"a": [1, 2]}));
/// ```
pub fn from_str(format: &str, text: &str) -> Result<Value> {
    registry::global().decode(format, text.as_bytes(), true)
}

/// Encodes `value` as `format` into a string.
///
/// # Errors
///
/// Returns [`Error::Encode`] for binary formats.
///
/// ```rust
/// use config_formats::{to_string, value};
///
/// assert_eq!(to_string("json", &value!({"a": 1}), false).unwrap(), r#"{"a":1}"#);
/// assert!(to_string("msgpack", &value!(1), false).is_err());
/// ```
pub fn to_string(format: &str, value: &Value, pretty: bool) -> Result<String> {
    let registry = registry::global();
    let codec = registry.resolve(format)?;
    if codec.descriptor().binary {
        return Err(Error::encode(codec.id(), "binary output is not text"));
    }
    let bytes = registry.encode(codec.id(), value, pretty)?;
    String::from_utf8(bytes).map_err(|e| Error::encode(codec.id(), e))
}
