//! JSON through `serde_json`.
//!
//! Decoding reads exactly one JSON value and stops, leaving any trailing
//! bytes for the strict remainder check. Encoding requires text keys (the
//! bound policy forces them) and finite floats.

use crate::{Codec, CodecDescriptor, Error, Input, NormalizationPolicy, Result, Value};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

const ID: &str = "json";

pub struct JsonCodec {
    descriptor: CodecDescriptor,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonCodec {
    #[must_use]
    pub fn new() -> Self {
        JsonCodec {
            descriptor: CodecDescriptor::new(ID, "JSON")
                .with_extensions(&[".json"])
                .with_pre_encode(NormalizationPolicy::new().with_force_string_keys(true)),
        }
    }
}

fn check_finite(value: &Value) -> Result<()> {
    match value {
        Value::Float(f) if !f.is_finite() => Err(Error::encode(
            ID,
            format!("{} has no JSON representation", Value::Float(*f)),
        )),
        Value::Sequence(items) => items.iter().try_for_each(check_finite),
        Value::Mapping(map) => map.values().try_for_each(check_finite),
        _ => Ok(()),
    }
}

impl Codec for JsonCodec {
    fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    fn decode(&self, input: &mut Input<'_>) -> Result<Value> {
        let mut stream = serde_json::Deserializer::from_slice(input.remaining()).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                let consumed = stream.byte_offset();
                input.take(consumed);
                input.skip_whitespace();
                Ok(value)
            }
            Some(Err(e)) => Err(Error::decode(ID, e)),
            None => Err(Error::decode(ID, "expected a value, found end of input")),
        }
    }

    fn encode(&self, value: &Value, pretty: bool) -> Result<Vec<u8>> {
        check_finite(value)?;
        if !pretty {
            return serde_json::to_vec(value).map_err(|e| Error::encode(ID, e));
        }
        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        value
            .serialize(&mut serializer)
            .map_err(|e| Error::encode(ID, e))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{check_remainder, value, Mapping};

    #[test]
    fn test_decode_stops_after_one_value() {
        let codec = JsonCodec::new();
        let mut input = Input::new(b" [1, 2]  \n{}");
        assert_eq!(codec.decode(&mut input).unwrap(), value!([1, 2]));
        assert_eq!(input.remaining(), b"{}");
        assert!(matches!(
            check_remainder(&mut input, ID),
            Err(Error::RemainingData { len: 2, .. })
        ));
    }

    #[test]
    fn test_decode_errors() {
        let codec = JsonCodec::new();
        assert!(matches!(codec.decode_slice(b"", true), Err(Error::Decode { .. })));
        assert!(matches!(codec.decode_slice(b"  ", true), Err(Error::Decode { .. })));
        assert!(matches!(codec.decode_slice(b"{\"a\"", true), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_decode_keeps_order_and_duplicates() {
        let v = JsonCodec::new().decode_slice(br#"{"b": 1, "a": 2, "b": 3}"#, true).unwrap();
        let keys: Vec<String> = v.as_mapping().unwrap().keys().map(Value::to_text).collect();
        assert_eq!(keys, ["b", "a", "b"]);
    }

    #[test]
    fn test_large_integers() {
        let v = JsonCodec::new().decode_slice(b"18446744073709551615", true).unwrap();
        assert_eq!(v, Value::from(u64::MAX));
    }

    #[test]
    fn test_encode_compact_and_pretty() {
        let codec = JsonCodec::new();
        let v = value!({"a": [1, "x"], "b": null});
        assert_eq!(codec.encode(&v, false).unwrap(), br#"{"a":[1,"x"],"b":null}"#);
        assert_eq!(
            String::from_utf8(codec.encode(&value!({"a": 1}), true).unwrap()).unwrap(),
            "{\n    \"a\": 1\n}"
        );
    }

    #[test]
    fn test_encode_rejects_bad_shapes() {
        let codec = JsonCodec::new();
        assert!(matches!(
            codec.encode(&Value::Sequence(vec![Value::Float(f64::NAN)]), false),
            Err(Error::Encode { .. })
        ));

        let mut map = Mapping::new();
        map.push(value!([1]), value!("x"));
        assert!(matches!(
            codec.encode(&Value::Mapping(map), false),
            Err(Error::Encode { .. })
        ));
    }

    #[test]
    fn test_unicode_kept_verbatim() {
        let bytes = JsonCodec::new().encode(&value!("grüße"), false).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "\"grüße\"");
    }
}
