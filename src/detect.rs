//! Input format auto-detection.
//!
//! Detection tries every registered codec in registration order on the
//! same bytes. A codec is accepted only if it decodes *and* consumes the
//! whole input; the first one that does wins. Because many formats accept
//! a prefix of another format's documents (a JSON object starts with the
//! MessagePack fixint `0x7b`), the strict remainder check is what makes
//! the order safe.

use crate::error::FormatFailure;
use crate::{Codec, Error, Registry, Result, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A successfully detected and decoded input.
#[derive(Clone)]
pub struct Detected {
    /// Decoded value, post-decode policy applied.
    pub value: Value,
    /// The codec that accepted the input.
    pub codec: Arc<dyn Codec>,
}

impl fmt::Debug for Detected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detected")
            .field("value", &self.value)
            .field("codec", &self.codec.id())
            .finish()
    }
}

impl Registry {
    /// Decodes `bytes` with the first codec that accepts all of them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMatchingFormat`] listing every codec's failure
    /// when none accepts the input. Errors that are not
    /// [recoverable](Error::is_recoverable) stop detection immediately.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_formats::{registry, value};
    ///
    /// let detected = registry::global().detect(b"[server]\nport = 8080\n").unwrap();
    /// assert_eq!(detected.codec.id(), "toml");
    /// assert_eq!(detected.value, value!({"server": {"port": 8080}}));
    /// ```
    pub fn detect(&self, bytes: &[u8]) -> Result<Detected> {
        let mut failures = Vec::new();
        for codec in self.iter() {
            let id = codec.id();
            let attempt = codec
                .check_detectable(bytes)
                .and_then(|()| codec.decode_slice(bytes, true));
            match attempt {
                Ok(value) => {
                    debug!(format = id, rejected = failures.len(), "detected input format");
                    return Ok(Detected {
                        value: self.finish_decode(codec.as_ref(), value),
                        codec: Arc::clone(codec),
                    });
                }
                Err(error) if error.is_recoverable() => {
                    debug!(format = id, error = %error, "input rejected");
                    failures.push(FormatFailure {
                        format: id.to_string(),
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }
        Err(Error::NoMatchingFormat { failures })
    }
}

/// Detects and decodes `bytes` with the global registry.
pub fn detect(bytes: &[u8]) -> Result<Detected> {
    crate::registry::global().detect(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{JsonCodec, MsgPackCodec};
    use crate::{value, CodecDescriptor, Input};

    #[test]
    fn test_detect_json() {
        let detected = detect(br#"{"a": [1, 2]}"#).unwrap();
        assert_eq!(detected.codec.id(), "json");
        assert_eq!(detected.value, value!({"a": [1, 2]}));
    }

    #[test]
    fn test_detect_msgpack() {
        // {"a": 1}
        let detected = detect(&[0x81, 0xa1, b'a', 0x01]).unwrap();
        assert_eq!(detected.codec.id(), "msgpack");
        assert_eq!(detected.value, value!({"a": 1}));
    }

    #[test]
    fn test_remainder_check_protects_order() {
        let mut registry = Registry::new();
        registry.register(Arc::new(MsgPackCodec::new())).unwrap();
        registry.register(Arc::new(JsonCodec::new())).unwrap();

        // msgpack reads `{` as the fixint 123 and leaves the rest
        let detected = registry.detect(br#"{"a":1}"#).unwrap();
        assert_eq!(detected.codec.id(), "json");
    }

    #[test]
    fn test_no_matching_format_lists_all_codecs() {
        match detect(br#"{"a": 1}}"#) {
            Err(Error::NoMatchingFormat { failures }) => {
                let formats: Vec<&str> = failures.iter().map(|f| f.format.as_str()).collect();
                assert_eq!(formats, ["json", "toml", "msgpack", "ini", "yaml"]);
                assert!(matches!(failures[0].error, Error::RemainingData { .. }));
            }
            other => panic!("expected NoMatchingFormat, got {other:?}"),
        }
    }

    struct Broken {
        descriptor: CodecDescriptor,
    }

    impl Codec for Broken {
        fn descriptor(&self) -> &CodecDescriptor {
            &self.descriptor
        }

        fn decode(&self, _input: &mut Input<'_>) -> Result<Value> {
            Err(Error::custom("codec crashed"))
        }

        fn encode(&self, _value: &Value, _pretty: bool) -> Result<Vec<u8>> {
            Err(Error::custom("codec crashed"))
        }
    }

    #[test]
    fn test_unrecoverable_error_propagates() {
        let mut registry = Registry::new();
        registry
            .register(Arc::new(Broken {
                descriptor: CodecDescriptor::new("broken", "Broken"),
            }))
            .unwrap();
        registry.register(Arc::new(JsonCodec::new())).unwrap();
        assert!(matches!(registry.detect(b"1"), Err(Error::Custom(_))));
    }

    #[test]
    fn test_empty_registry() {
        assert!(matches!(
            Registry::new().detect(b"1"),
            Err(Error::NoMatchingFormat { failures }) if failures.is_empty()
        ));
    }
}
